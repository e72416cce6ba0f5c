use crate::models::Config;

/// A configuration problem that does not stop the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// What is wrong.
    pub message: String,
    /// How to fix it, when there is an obvious fix.
    pub hint: Option<String>,
}

/// Warnings collected during a load, in discovery order.
#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    /// The collected warnings.
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    /// Record a warning without a hint.
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    /// Record a warning with a hint.
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    /// `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append every warning from `other`.
    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

/// Non-fatal checks on a composed configuration. Missing roots are only
/// warned about: they may be mounted later, and each poll cycle reports
/// them again as enumeration errors.
pub fn check_watch_folders(config: &Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.watch.folders.is_empty() {
        warnings.push_with_hint(
            "no watch folders configured",
            "Set WATCH_FOLDERS, pass --watch-folder, or add [watch] folders to converterd.toml",
        );
        return warnings;
    }

    for folder in &config.watch.folders {
        if !folder.is_dir() {
            warnings.push(format!(
                "watch folder {} is not an accessible directory",
                folder.display()
            ));
        }
    }

    warnings
}
