//! Manifest rendering.
//!
//! Each cloud variant maps to one template. The whole manifest is rendered in
//! memory first, so a bad template or missing secret never leaves a partial
//! `install-config.yaml` behind.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config_file::{InstallConfig, VsphereConfig};
use crate::error::{InstallError, Result};
use crate::types::{Action, CloudVariant, RegistryEngine};

/// File name the installer expects in its working directory
pub const MANIFEST_FILENAME: &str = "install-config.yaml";

/// Lookup of template text by name.
pub trait TemplateSource: Send + Sync {
    /// `Ok(None)` when the source has no template by that name.
    fn template(&self, name: &str) -> Result<Option<Cow<'_, str>>>;
}

/// Templates compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplates;

impl TemplateSource for EmbeddedTemplates {
    fn template(&self, name: &str) -> Result<Option<Cow<'_, str>>> {
        let text = match name {
            "aws_basic.tmpl" => include_str!("../templates/aws_basic.tmpl"),
            "aws_sts.tmpl" => include_str!("../templates/aws_sts.tmpl"),
            "aws_odf.tmpl" => include_str!("../templates/aws_odf.tmpl"),
            "gcp_basic.tmpl" => include_str!("../templates/gcp_basic.tmpl"),
            "gcp_wif.tmpl" => include_str!("../templates/gcp_wif.tmpl"),
            "vsphere_basic.tmpl" => include_str!("../templates/vsphere_basic.tmpl"),
            "azure_basic.tmpl" => include_str!("../templates/azure_basic.tmpl"),
            "azure_wi.tmpl" => include_str!("../templates/azure_wi.tmpl"),
            "alibaba_basic.tmpl" => include_str!("../templates/alibaba_basic.tmpl"),
            _ => return Ok(None),
        };
        Ok(Some(Cow::Borrowed(text)))
    }
}

/// Templates read from a directory at render time, for local overrides.
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    pub root: PathBuf,
}

impl TemplateSource for DirectoryTemplates {
    fn template(&self, name: &str) -> Result<Option<Cow<'_, str>>> {
        match fs::read_to_string(self.root.join(name)) {
            Ok(text) => Ok(Some(Cow::Owned(text))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Values visible to templates.
#[derive(Debug, Serialize)]
struct TemplateContext<'a> {
    action: Action,
    cloud: CloudVariant,
    cluster_name: &'a str,
    infra_name: String,
    user_name: &'a str,
    output_dir: &'a Path,
    cloud_region: &'a str,
    image: &'a str,
    engine: RegistryEngine,
    dry_run: bool,
    ssh_public_key: &'a str,
    pull_secret: &'a str,
    gcp_project: &'a str,
    azure_dns_resource_group: &'a str,
    vsphere: VsphereContext<'a>,
}

#[derive(Debug, Serialize)]
struct VsphereContext<'a> {
    vcenter: &'a str,
    password: &'a str,
    base_domain: &'a str,
    vcenter_subdomain: &'a str,
    api_vip: &'a str,
    ingress_vip: &'a str,
}

impl<'a> From<&'a VsphereConfig> for VsphereContext<'a> {
    fn from(v: &'a VsphereConfig) -> Self {
        Self {
            vcenter: &v.vcenter,
            password: &v.password,
            base_domain: &v.base_domain,
            vcenter_subdomain: &v.vcenter_subdomain,
            api_vip: &v.api_vip,
            ingress_vip: &v.ingress_vip,
        }
    }
}

impl<'a> TemplateContext<'a> {
    fn new(config: &'a InstallConfig) -> Self {
        Self {
            action: config.action,
            cloud: config.cloud,
            cluster_name: &config.cluster_name,
            infra_name: config.cloud.infra_name(&config.cluster_name),
            user_name: &config.user_name,
            output_dir: &config.output_dir,
            cloud_region: &config.cloud_region,
            image: &config.image,
            engine: config.engine,
            dry_run: config.dry_run,
            ssh_public_key: &config.ssh_public_key,
            pull_secret: &config.pull_secret,
            gcp_project: &config.gcp_project,
            azure_dns_resource_group: &config.azure_dns_resource_group,
            vsphere: (&config.vsphere).into(),
        }
    }
}

/// Renders `install-config.yaml` for a configuration.
pub struct TemplateRenderer<'s> {
    source: &'s dyn TemplateSource,
}

impl<'s> TemplateRenderer<'s> {
    pub fn new(source: &'s dyn TemplateSource) -> Self {
        Self { source }
    }

    /// Render the variant's template into `<output_dir>/install-config.yaml`.
    ///
    /// Returns the path written. On any error nothing is written, though
    /// the output directory may already exist.
    pub fn render(&self, config: &InstallConfig) -> Result<PathBuf> {
        let name = config.cloud.template_name();
        let text = self
            .source
            .template(name)?
            .ok_or_else(|| InstallError::TemplateNotFound {
                cloud: config.cloud.to_string(),
                supported: CloudVariant::supported(),
            })?;

        let resolved = config.materialize_secrets()?;
        let rendered = render_text(name, &text, &resolved)?;

        fs::create_dir_all(&config.output_dir)?;
        let path = config.output_dir.join(MANIFEST_FILENAME);
        fs::write(&path, rendered)?;
        info!("Wrote {} for {}", path.display(), config.cloud);
        Ok(path)
    }
}

/// Render template text against a configuration whose secrets are already loaded.
pub fn render_text(name: &str, text: &str, config: &InstallConfig) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env.add_template(name, text)?;

    debug!("Rendering template {}", name);
    let rendered = env.get_template(name)?.render(TemplateContext::new(config))?;
    Ok(rendered)
}
