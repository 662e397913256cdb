//! Tests for manifest rendering

mod common;

use common::*;
use install_tools::InstallError;
use install_tools::template::{
    DirectoryTemplates, EmbeddedTemplates, MANIFEST_FILENAME, TemplateRenderer, TemplateSource,
};
use install_tools::types::CloudVariant;
use std::borrow::Cow;
use std::fs;

/// Source with no templates at all
struct EmptyTemplates;

impl TemplateSource for EmptyTemplates {
    fn template(&self, _name: &str) -> install_tools::Result<Option<Cow<'_, str>>> {
        Ok(None)
    }
}

#[test]
fn test_render_writes_manifest_with_compact_secret() {
    let ws = Workspace::new();
    let path = TemplateRenderer::new(&EmbeddedTemplates)
        .render(&ws.config(CloudVariant::Aws))
        .unwrap();

    assert_eq!(path, ws.output_dir().join(MANIFEST_FILENAME));
    let manifest = fs::read_to_string(&path).unwrap();
    assert!(manifest.contains(
        r#"pullSecret: '{"auths":{"quay.io":{"auth":"dXNlcjpwYXNz","email":"tester@example.com"},"registry.ci.openshift.org":{"auth":"Y2k6dG9rZW4="}}}'"#
    ));
    assert!(manifest.contains("  ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIExample tester@example.com"));
    assert!(manifest.contains("name: Tester-Cluster_01"));
    assert!(manifest.contains("region: us-east-1"));
}

#[test]
fn test_secret_whitespace_does_not_change_output() {
    let pretty = Workspace::new();
    let compact = Workspace::new();
    let minified = install_tools::config_file::compact_json(PULL_SECRET).unwrap();
    fs::write(compact.pull_secret(), minified).unwrap();

    let renderer = TemplateRenderer::new(&EmbeddedTemplates);
    let a = pretty.config(CloudVariant::GcpWif);
    let b = compact.config(CloudVariant::GcpWif);

    let first = fs::read(renderer.render(&a).unwrap()).unwrap();
    let second = fs::read(renderer.render(&b).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rerender_truncates_existing_manifest() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.output_dir()).unwrap();
    let path = ws.output_dir().join(MANIFEST_FILENAME);
    fs::write(&path, "x".repeat(64 * 1024)).unwrap();

    TemplateRenderer::new(&EmbeddedTemplates)
        .render(&ws.config(CloudVariant::Azure))
        .unwrap();
    let manifest = fs::read_to_string(&path).unwrap();
    assert!(manifest.starts_with("apiVersion: v1"));
    assert!(!manifest.contains("xxxx"));
}

#[test]
fn test_missing_template_names_supported_set_and_writes_nothing() {
    let ws = Workspace::new();
    let err = TemplateRenderer::new(&EmptyTemplates)
        .render(&ws.config(CloudVariant::Alibaba))
        .unwrap_err();

    match &err {
        InstallError::TemplateNotFound { cloud, supported } => {
            assert_eq!(cloud, "alibaba");
            assert_eq!(supported.len(), 9);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_configuration());
    assert!(!ws.output_dir().exists());
}

#[test]
fn test_invalid_pull_secret_writes_nothing() {
    let ws = Workspace::new();
    fs::write(ws.pull_secret(), "{ not json").unwrap();
    let err = TemplateRenderer::new(&EmbeddedTemplates)
        .render(&ws.config(CloudVariant::Aws))
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(!ws.output_dir().join(MANIFEST_FILENAME).exists());
}

#[test]
fn test_missing_ssh_key_writes_nothing() {
    let ws = Workspace::new();
    let mut config = ws.config(CloudVariant::Aws);
    config.ssh_public_key_file = ws.path().join("missing.pub");
    assert!(TemplateRenderer::new(&EmbeddedTemplates).render(&config).is_err());
    assert!(!ws.output_dir().exists());
}

#[test]
fn test_template_syntax_error_writes_nothing() {
    let ws = Workspace::new();
    let templates = ws.path().join("templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("aws_basic.tmpl"), "name: {{ cluster_name ").unwrap();

    let source = DirectoryTemplates { root: templates };
    let err = TemplateRenderer::new(&source)
        .render(&ws.config(CloudVariant::Aws))
        .unwrap_err();
    assert!(matches!(err, InstallError::Template(_)), "got {err:?}");
    assert!(!ws.output_dir().exists());
}

#[test]
fn test_unreadable_template_is_io_error() {
    let ws = Workspace::new();
    let templates = ws.path().join("templates");
    fs::create_dir_all(templates.join("aws_basic.tmpl")).unwrap();

    let source = DirectoryTemplates { root: templates };
    let err = TemplateRenderer::new(&source)
        .render(&ws.config(CloudVariant::Aws))
        .unwrap_err();
    assert!(matches!(err, InstallError::Io(_)), "got {err:?}");
    assert!(!ws.output_dir().exists());
}

#[test]
fn test_directory_without_template_is_not_found() {
    let ws = Workspace::new();
    let source = DirectoryTemplates {
        root: ws.path().join("no-templates"),
    };
    let err = TemplateRenderer::new(&source)
        .render(&ws.config(CloudVariant::Gcp))
        .unwrap_err();
    assert!(matches!(err, InstallError::TemplateNotFound { .. }), "got {err:?}");
}

#[test]
fn test_directory_templates_override() {
    let ws = Workspace::new();
    let templates = ws.path().join("templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(
        templates.join("vsphere_basic.tmpl"),
        "cluster: {{ cluster_name }}\nvcenter: {{ vsphere.vcenter }}\n",
    )
    .unwrap();

    let source = DirectoryTemplates { root: templates };
    let mut config = ws.config(CloudVariant::Vsphere);
    config.vsphere.vcenter = "vcenter.lab.example.com".to_string();
    let path = TemplateRenderer::new(&source).render(&config).unwrap();
    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "cluster: Tester-Cluster_01\nvcenter: vcenter.lab.example.com\n"
    );
}
