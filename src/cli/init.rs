//! Project initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Initialize a new project
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Project name / directory
    #[arg(default_value = ".")]
    pub name: String,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let project_dir = Path::new(&self.name);

        eprintln!("{} Initializing new project...\n", "→".blue());

        // Create project directory if needed
        if self.name != "." {
            fs::create_dir_all(project_dir).context("Failed to create project directory")?;
        }

        // Generate commons.toml
        fs::write(project_dir.join("commons.toml"), self.generate_config())
            .context("Failed to write commons.toml")?;
        eprintln!("  {} Created {}", "✓".green(), "commons.toml".cyan());

        // Generate the demo sources: two entries sharing a vendor layer and
        // a component layer, so the scaffold exercises shared chunks out of
        // the box
        self.generate_sources(project_dir)?;

        // Generate index.html wired to the un-hashed bundle names
        fs::write(project_dir.join("index.html"), self.generate_index_html())
            .context("Failed to write index.html")?;
        eprintln!("  {} Created {}", "✓".green(), "index.html".cyan());

        eprintln!("\n{} Project initialized successfully!\n", "✓".green().bold());

        eprintln!("  Next steps:");
        if self.name != "." {
            eprintln!("    {} cd {}", "→".dimmed(), self.name.cyan());
        }
        eprintln!("    {} commons build", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn generate_config(&self) -> String {
        format!(
            r#"# Commons configuration

[project]
name = "{name}"
version = "0.1.0"

[entrypoints]
app = "src/app.js"
admin = "src/admin.js"

[output]
dir = "dist"
hash = false
manifest = true

# Code shared by both entries is pulled out of them: vendor first, then
# application components layered on top of it.

[[shared_chunks]]
name = "vendor"
chunks = ["app", "admin"]
include = ["**/vendor/**"]

[[shared_chunks]]
name = "components"
chunks = ["app", "admin"]
min_chunks = 2
include = ["**/components/**"]
"#,
            name = if self.name == "." { "my-app" } else { &self.name },
        )
    }

    fn generate_sources(&self, project_dir: &Path) -> Result<()> {
        let src_dir = project_dir.join("src");
        fs::create_dir_all(src_dir.join("vendor"))?;
        fs::create_dir_all(src_dir.join("components"))?;

        let files: &[(&str, &str)] = &[
            (
                "vendor/dom.js",
                r#"export function el(tag, text) {
  const node = document.createElement(tag);
  node.textContent = text;
  return node;
}
"#,
            ),
            (
                "vendor/store.js",
                r#"import { el } from './dom';

const state = {};

export function set(key, value) {
  state[key] = value;
}

export function get(key) {
  return state[key];
}

export function render(target) {
  target.appendChild(el('pre', JSON.stringify(state)));
}
"#,
            ),
            (
                "components/header.js",
                r#"import { el } from '../vendor/dom';

export function header(title) {
  return el('h1', title);
}
"#,
            ),
            (
                "app.js",
                r#"import { header } from './components/header';
import { set, render } from './vendor/store';

document.body.appendChild(header('App'));
set('screen', 'app');
render(document.body);
"#,
            ),
            (
                "admin.js",
                r#"import { header } from './components/header';
import { set, render } from './vendor/store';

document.body.appendChild(header('Admin'));
set('screen', 'admin');
render(document.body);
"#,
            ),
        ];

        for (name, content) in files {
            fs::write(src_dir.join(name), content)?;
            eprintln!("  {} Created {}", "✓".green(), format!("src/{}", name).cyan());
        }

        Ok(())
    }

    fn generate_index_html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{}</title>
  </head>
  <body>
    <!-- Load order: shared chunks first, entry last (see dist/manifest.json) -->
    <script src="/dist/vendor.js"></script>
    <script src="/dist/components.js"></script>
    <script src="/dist/app.js"></script>
  </body>
</html>
"#,
            if self.name == "." { "My App" } else { &self.name },
        )
    }
}
