use std::fs;

use anyhow::{Context, Result};
use serde::Serialize;

use s2e_core::env::Environment;
use s2e_core::images;

use crate::commands::print_dir_status;

#[derive(Serialize)]
pub struct EnvInfoSnapshot {
    pub root: String,
    pub version: String,
    pub marker: String,
    pub images: Vec<ImageSummary>,
    pub projects: Vec<ProjectSummary>,
}

#[derive(Serialize)]
pub struct ImageSummary {
    pub name: String,
    pub arch: String,
    pub os: String,
}

#[derive(Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub path: String,
    pub project_type: Option<String>,
    pub target: Option<String>,
}

/// Show a summary of the environment: settings, image inventory, and
/// project inventory.
pub fn info_command(env: &Environment, json: bool) -> Result<()> {
    let images = images::list_images(&env.images_dir())?
        .into_iter()
        .map(|descriptor| ImageSummary {
            name: descriptor.name,
            arch: descriptor.os.arch,
            os: descriptor.os.name,
        })
        .collect::<Vec<_>>();

    let projects = collect_projects(env)?;

    if json {
        let snapshot = EnvInfoSnapshot {
            root: env.root().display().to_string(),
            version: env.settings().version.clone(),
            marker: env.marker_path().display().to_string(),
            images,
            projects,
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("S2E Environment Info");
    println!("====================");
    println!("Root: {}", env.root().display());
    println!("Version: {}", env.settings().version);
    println!();
    println!("Directories:");
    print_dir_status("Projects dir", &env.projects_dir());
    print_dir_status("Images dir", &env.images_dir());
    print_dir_status("Source dir", &env.source_dir());
    print_dir_status("Install dir", &env.install_dir());
    print_dir_status("Build dir", &env.build_dir());
    println!();

    println!("Images ({}):", images.len());
    if images.is_empty() {
        println!("  (none)");
    }
    for image in &images {
        println!("  - {} [{} {}]", image.name, image.os, image.arch);
    }
    println!();

    println!("Projects ({}):", projects.len());
    if projects.is_empty() {
        println!("  (none)");
    }
    for project in &projects {
        let kind = project.project_type.as_deref().unwrap_or("-");
        let target = project.target.as_deref().unwrap_or("-");
        println!("  - {} [{}] target={}", project.name, kind, target);
    }

    Ok(())
}

/// Scan `projects/` for created projects, reading what the descriptor
/// reveals about each. A directory without a parseable `project.json` is
/// still listed, with unknown type/target.
fn collect_projects(env: &Environment) -> Result<Vec<ProjectSummary>> {
    let mut projects = Vec::new();
    let projects_dir = env.projects_dir();
    if !projects_dir.is_dir() {
        return Ok(projects);
    }

    for entry in fs::read_dir(&projects_dir)
        .with_context(|| format!("Failed to read {}", projects_dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();

        let descriptor: Option<serde_json::Value> = fs::read_to_string(path.join("project.json"))
            .ok()
            .and_then(|body| serde_json::from_str(&body).ok());
        let field = |key: &str| {
            descriptor
                .as_ref()
                .and_then(|d| d.get(key).and_then(|v| v.as_str()))
                .map(str::to_string)
        };

        projects.push(ProjectSummary {
            name,
            path: path.display().to_string(),
            project_type: field("project_type"),
            target: field("target"),
        });
    }

    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}
