use colored::Colorize;

pub struct Theme {
    pub title: fn(&str) -> String,
    pub label: fn(&str) -> String,
    pub body: fn(&str) -> String,
    pub line: fn(&str) -> String,
    pub good: fn(&str) -> String,
    pub warn: fn(&str) -> String,
    pub dim: fn(&str) -> String,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name {
            "default" | "" => Self::default_theme(),
            "mono" => Self::mono(),
            _ => {
                eprintln!("{}", format!("✘ Unknown theme: {}", name).red());
                Self::default_theme()
            }
        }
    }

    fn default_theme() -> Self {
        Self {
            title: |s| s.bright_blue().bold().underline().to_string(),
            label: |s| s.cyan().to_string(),
            body: |s| s.normal().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            good: |s| s.green().bold().to_string(),
            warn: |s| s.yellow().bold().to_string(),
            dim: |s| s.bright_black().italic().to_string(),
        }
    }

    fn mono() -> Self {
        Self {
            title: |s| s.bold().to_string(),
            label: |s| s.to_string(),
            body: |s| s.to_string(),
            line: |s| s.to_string(),
            good: |s| s.bold().to_string(),
            warn: |s| s.bold().to_string(),
            dim: |s| s.to_string(),
        }
    }
}
