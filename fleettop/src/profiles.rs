//! Connection profiles: load/save simple JSON mapping of profile name -> { url, interval_ms }
//! Stored under XDG config dir: $XDG_CONFIG_HOME/fleettop/profiles.json (fallback ~/.config/fleettop/profiles.json)

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("fleettop")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fleettop")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

pub fn load_profiles() -> ProfilesFile {
    let path = profiles_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable profiles file");
            ProfilesFile::default()
        }),
        Err(_) => ProfilesFile::default(),
    }
}

pub fn save_profiles(p: &ProfilesFile) -> std::io::Result<()> {
    let path = profiles_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p)?;
    fs::write(path, data)
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveProfile {
    /// Use the provided runtime inputs (not persisted).
    Direct(ProfileEntry),
    /// Loaded from existing profile entry
    Loaded(ProfileEntry),
    /// Should prompt user to select among profile names
    PromptSelect(Vec<String>),
    /// Should prompt user to create a new profile (name)
    PromptCreate(String),
    /// No profile could be resolved (e.g., missing arguments)
    None,
}

pub struct ProfileRequest {
    pub profile_name: Option<String>,
    pub url: Option<String>,
    pub interval_ms: Option<u64>,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        match (self.url, self.profile_name) {
            // Both provided (or url only) -> direct, maybe saved later by caller
            (Some(url), _) => ResolveProfile::Direct(ProfileEntry {
                url,
                interval_ms: self.interval_ms,
            }),
            // Only profile name given -> try load; CLI interval wins over the stored one
            (None, Some(name)) => match pf.profiles.get(&name) {
                Some(entry) => ResolveProfile::Loaded(ProfileEntry {
                    url: entry.url.clone(),
                    interval_ms: self.interval_ms.or(entry.interval_ms),
                }),
                None => ResolveProfile::PromptCreate(name),
            },
            // Nothing provided -> maybe prompt select if profiles exist
            (None, None) => {
                if pf.profiles.is_empty() {
                    ResolveProfile::None
                } else {
                    ResolveProfile::PromptSelect(pf.profiles.keys().cloned().collect())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(name: &str, url: &str, interval_ms: Option<u64>) -> ProfilesFile {
        let mut pf = ProfilesFile::default();
        pf.profiles.insert(
            name.into(),
            ProfileEntry {
                url: url.into(),
                interval_ms,
            },
        );
        pf
    }

    #[test]
    fn resolve_rules() {
        let pf = file_with("lab", "http://lab:3232", Some(2000));
        let req = |name: Option<&str>, url: Option<&str>, iv: Option<u64>| ProfileRequest {
            profile_name: name.map(Into::into),
            url: url.map(Into::into),
            interval_ms: iv,
        };

        assert_eq!(
            req(Some("lab"), None, None).resolve(&pf),
            ResolveProfile::Loaded(ProfileEntry {
                url: "http://lab:3232".into(),
                interval_ms: Some(2000)
            })
        );
        assert_eq!(
            req(Some("lab"), None, Some(500)).resolve(&pf),
            ResolveProfile::Loaded(ProfileEntry {
                url: "http://lab:3232".into(),
                interval_ms: Some(500)
            })
        );
        assert_eq!(
            req(Some("new"), None, None).resolve(&pf),
            ResolveProfile::PromptCreate("new".into())
        );
        assert_eq!(
            req(None, Some("http://x"), None).resolve(&pf),
            ResolveProfile::Direct(ProfileEntry {
                url: "http://x".into(),
                interval_ms: None
            })
        );
        assert_eq!(
            req(None, None, None).resolve(&pf),
            ResolveProfile::PromptSelect(vec!["lab".into()])
        );
        assert_eq!(
            req(None, None, None).resolve(&ProfilesFile::default()),
            ResolveProfile::None
        );
    }
}
