//! Registry authentication.
//!
//! Every later tool pulls from the release registry, so access is verified
//! once up front and a rejected login aborts the run.

use crate::command_executor::CommandRunner;
use crate::error::{InstallError, Result};
use crate::tool_args::ToolArgs;
use crate::tools::engine::RegistryLoginArgs;
use crate::types::RegistryEngine;
use std::path::Path;
use tracing::info;

/// Resolve the registry host to log in to from an image reference.
///
/// With a scheme (`https://host/...`, or the opaque `host:port/...` form)
/// the port and path are dropped and the last two host labels are kept.
/// Without one the first path segment is returned as-is.
///
/// ```
/// use install_tools::registry::registry_domain;
///
/// assert_eq!(registry_domain("registry.example.com:5000/ns/image:tag").unwrap(), "example.com");
/// assert_eq!(registry_domain("myhost/ns/image").unwrap(), "myhost");
/// ```
pub fn registry_domain(image: &str) -> Result<String> {
    let image = image.trim();
    if image.is_empty() {
        return Err(InstallError::config("Image reference is empty"));
    }

    let Some((scheme, rest)) = split_scheme(image) else {
        let first = image.split('/').next().unwrap_or(image);
        return Ok(first.to_string());
    };

    let host = match rest.strip_prefix("//") {
        Some(authority) => {
            let authority = authority.split(['/', '?', '#']).next().unwrap_or("");
            let authority = authority.rsplit('@').next().unwrap_or(authority);
            authority.split(':').next().unwrap_or(authority)
        }
        // `host:port/path`: the part parsed as a scheme is the host itself
        None => scheme,
    };
    if host.is_empty() {
        return Err(InstallError::config(format!(
            "Could not find a registry host in image reference {}",
            image
        )));
    }

    let labels: Vec<&str> = host.split('.').collect();
    Ok(labels[labels.len().saturating_sub(2)..].join("."))
}

/// Split off a URL scheme: letters first, then letters, digits, `+`, `-`, `.`,
/// ending at a `:` that comes before any `/`.
fn split_scheme(reference: &str) -> Option<(&str, &str)> {
    let colon = reference.find(':')?;
    if reference[..colon].contains('/') {
        return None;
    }
    let scheme = &reference[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }
    Some((scheme, &reference[colon + 1..]))
}

/// Log in to the image's registry with the pull secret as credential source.
///
/// A non-zero exit from the engine is an authentication failure. No retry.
pub fn ensure_registry_login(
    runner: &dyn CommandRunner,
    pull_secret_file: &Path,
    image: &str,
    engine: RegistryEngine,
) -> Result<()> {
    let registry = registry_domain(image)?;
    let args = RegistryLoginArgs {
        engine,
        pull_secret: pull_secret_file.to_path_buf(),
        registry: registry.clone(),
    };
    info!("Verifying we can login with {} to: {}", engine, registry);

    let result = runner.run(&args.invocation(None));
    if result.success() {
        info!("Registry login to {} succeeded", registry);
        Ok(())
    } else {
        Err(InstallError::authentication(format!(
            "{} login to {} failed (exit code {}): {}",
            engine, registry, result.exit_code, result.stderr
        )))
    }
}
