//! Property renaming and recasing.

use crate::errors::ConfigError;
use crate::pipeline::RenameRule;
use crate::pipeline::{ranks, Next, Stage};
use crate::record::{PropertyRoles, Record};
use regex::Regex;

#[derive(Debug)]
enum CompiledRule {
    RemovePattern(Regex),
    Replace { from: String, to: String },
    CamelCase { names: Vec<String> },
}

/// Applies configured rename rules and casing transforms to property
/// names, leaving the order of other properties untouched.
///
/// Meta properties are pipeline bookkeeping and are left alone.
#[derive(Debug)]
pub struct RenameStage {
    rules: Vec<CompiledRule>,
}

impl RenameStage {
    /// Compiles the configured rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty rule list or an invalid
    /// pattern; configuration errors are fatal at first use.
    pub fn new(rules: &[RenameRule]) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(
                ConfigError::new("rename stage configured without rules").for_stage("rename")
            );
        }
        let compiled = rules
            .iter()
            .map(|rule| match rule {
                RenameRule::RemovePattern { pattern } => Regex::new(pattern)
                    .map(CompiledRule::RemovePattern)
                    .map_err(|e| {
                        ConfigError::new(format!("invalid rename pattern '{pattern}': {e}"))
                            .for_stage("rename")
                    }),
                RenameRule::Replace { from, to } => Ok(CompiledRule::Replace {
                    from: from.clone(),
                    to: to.clone(),
                }),
                RenameRule::CamelCase { names } => Ok(CompiledRule::CamelCase {
                    names: names.clone(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules: compiled })
    }

    fn transform(&self, name: &str) -> String {
        let mut out = name.to_string();
        for rule in &self.rules {
            out = match rule {
                CompiledRule::RemovePattern(re) => re.replace_all(&out, "").into_owned(),
                CompiledRule::Replace { from, to } => {
                    if out.eq_ignore_ascii_case(from) {
                        to.clone()
                    } else {
                        out
                    }
                }
                CompiledRule::CamelCase { names } => {
                    if names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(&out)) {
                        camel_case(&out)
                    } else {
                        out
                    }
                }
            };
        }
        out
    }
}

/// Recases a snake/kebab/space-separated name to camelCase.
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for (i, ch) in name.chars().enumerate() {
        if ch == '_' || ch == '-' || ch == ' ' {
            upper_next = i > 0;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else if i == 0 {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

impl Stage for RenameStage {
    fn name(&self) -> &str {
        "rename"
    }

    fn rank(&self) -> i32 {
        ranks::RENAME
    }

    fn invoke(&self, record: &mut Record, next: Next<'_>) {
        let renames: Vec<(String, String)> = record
            .iter()
            .filter(|p| !p.has_role(PropertyRoles::META))
            .filter_map(|p| {
                let renamed = self.transform(&p.name);
                (renamed != p.name && !renamed.is_empty()).then(|| (p.name.clone(), renamed))
            })
            .collect();

        for (from, to) in renames {
            record.rename(&from, &to);
        }

        next.invoke(record);
    }
}
