//! Type-safe arguments for the external tools driven by the pipeline.
//!
//! - `oc` for release extraction and image inspection
//! - `openshift-install` for manifests and create/destroy
//! - `ccoctl` for cloud credential manifests
//! - `docker`/`podman` for registry login
//! - `gcloud` and `az` for provider-specific pre-steps

pub mod az;
pub mod ccoctl;
pub mod engine;
pub mod gcloud;
pub mod oc;
pub mod openshift_install;

/// Directory (relative to the output dir) holding extracted CredentialsRequests
pub const CRED_REQUEST_DIR: &str = "./credRequests";
