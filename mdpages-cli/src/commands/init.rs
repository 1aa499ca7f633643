//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../mdpages.yml.example");

/// Initialize a new mdpages project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_config(root)?;
    scaffold_content(root)?;

    println!("✓ mdpages initialized in {:?}", root);
    println!("  - Edit mdpages.yml to change directories and routing");
    println!("  - Write pages in content/, then run `mdpages generate`");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("mdpages.yml");
    if config_path.exists() {
        println!("mdpages.yml already exists at {:?}", config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    Ok(())
}

fn scaffold_content(root: &Path) -> Result<()> {
    let content = root.join("content");
    fs::create_dir_all(&content).with_context(|| format!("Failed to create {:?}", content))?;

    // Starter page
    let sample = content.join("index.md");
    if !sample.exists() {
        fs::write(&sample, SAMPLE_PAGE).with_context(|| format!("Failed to write {:?}", sample))?;
        println!("Created {:?}", sample);
    }

    Ok(())
}

const SAMPLE_PAGE: &str = r#"---
title: Welcome
description: Your first generated page
tags: [mdpages, intro]
---

# Welcome

This page is served at the root route. Pages get their route from the file
name, or from a `route:` field in the frontmatter:

```yaml
route: /custom/path
```

HTML comment configuration works too:

```html
<!--
layout: Wide
showTitle: false
-->
```
"#;
