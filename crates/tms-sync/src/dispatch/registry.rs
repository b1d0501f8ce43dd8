//! Maps operation names, plain or `action:parameter`, to actions.

use std::collections::BTreeMap;

use super::batch::BatchParams;
use crate::actions::ActionKind;
use crate::engine::SyncEngine;
use crate::error::DispatchError;

/// What an operation accepts as its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parameter {
    None,
    /// Optional target language from the name suffix or the batch params.
    Language,
    /// Optional target language from the name suffix only. A language
    /// filter in the batch params does not narrow the operation.
    SuffixLanguage,
    /// Required profile id from the name suffix or the batch params.
    Profile,
    /// Job id from the batch params.
    JobId { required: bool },
}

/// The resolved parameter handed to an operation's builder.
#[derive(Debug, Default)]
struct Resolved {
    value: Option<String>,
    notify: bool,
}

struct Operation {
    parameter: Parameter,
    build: fn(Resolved) -> ActionKind,
}

pub struct OperationRegistry {
    operations: BTreeMap<&'static str, Operation>,
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationRegistry {
    pub fn new() -> Self {
        let mut operations = BTreeMap::new();
        let mut add = |name: &'static str, parameter: Parameter, build: fn(Resolved) -> ActionKind| {
            operations.insert(name, Operation { parameter, build });
        };

        add("upload", Parameter::JobId { required: false }, |r| ActionKind::Upload {
            job_id: r.value,
        });
        add("check_upload", Parameter::None, |_| ActionKind::CheckUpload);
        add("request_translation", Parameter::Language, |r| {
            ActionKind::RequestTranslations { langcode: r.value }
        });
        add("request_translations", Parameter::None, |_| {
            ActionKind::RequestTranslations { langcode: None }
        });
        add("check_translation", Parameter::Language, |r| {
            ActionKind::CheckTranslations { langcode: r.value }
        });
        add("check_translations", Parameter::None, |_| {
            ActionKind::CheckTranslations { langcode: None }
        });
        add("download", Parameter::Language, |r| ActionKind::Download {
            langcode: r.value,
        });
        add("download_translations", Parameter::None, |_| ActionKind::Download {
            langcode: None,
        });
        add("cancel", Parameter::SuffixLanguage, |r| ActionKind::Cancel {
            langcode: r.value,
        });
        add("change_profile", Parameter::Profile, |r| ActionKind::ChangeProfile {
            profile_id: r.value.unwrap_or_default(),
        });
        add("assign_job", Parameter::JobId { required: true }, |r| {
            ActionKind::AssignJob {
                job_id: r.value.unwrap_or_default(),
                notify: r.notify,
            }
        });
        add("clear_job", Parameter::None, |r| ActionKind::ClearJob { notify: r.notify });
        add("disassociate", Parameter::None, |_| ActionKind::Disassociate);
        add("debug_export", Parameter::None, |_| ActionKind::DebugExport);

        Self { operations }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.keys().copied()
    }

    /// Parses an operation name against the engine's languages and
    /// profiles. Every error here is a caller bug and aborts the batch.
    pub fn resolve(
        &self,
        operation: &str,
        params: &BatchParams,
        engine: &SyncEngine,
    ) -> Result<ActionKind, DispatchError> {
        let (name, suffix) = match operation.split_once(':') {
            Some((name, suffix)) => (name, Some(suffix)),
            None => (operation, None),
        };
        let entry = self
            .operations
            .get(name)
            .ok_or_else(|| DispatchError::UnknownOperation(operation.to_string()))?;

        let invalid = |parameter: &'static str, value: &str| DispatchError::InvalidParameter {
            operation: operation.to_string(),
            parameter,
            value: value.to_string(),
        };
        let missing = |parameter: &'static str| DispatchError::MissingParameter {
            operation: operation.to_string(),
            parameter,
        };

        if suffix == Some("") {
            return Err(invalid("parameter", ""));
        }

        let value = match entry.parameter {
            Parameter::None | Parameter::JobId { .. } if suffix.is_some() => {
                return Err(DispatchError::UnexpectedParameter(operation.to_string()));
            }
            Parameter::None => None,
            Parameter::Language | Parameter::SuffixLanguage => {
                let langcode = match entry.parameter {
                    Parameter::Language => suffix.or(params.language.as_deref()),
                    _ => suffix,
                };
                if let Some(langcode) = langcode {
                    if !engine.langcodes().iter().any(|l| l == langcode) {
                        return Err(invalid("language", langcode));
                    }
                }
                langcode.map(str::to_string)
            }
            Parameter::Profile => {
                let profile_id = suffix
                    .or(params.profile_id.as_deref())
                    .ok_or_else(|| missing("profile"))?;
                if !engine.profiles().contains(profile_id) {
                    return Err(invalid("profile", profile_id));
                }
                Some(profile_id.to_string())
            }
            Parameter::JobId { required } => match params.job_id.as_deref() {
                Some(job_id) if !is_valid_job_id(job_id) => {
                    return Err(invalid("job id", job_id));
                }
                Some(job_id) => Some(job_id.to_string()),
                None if required => return Err(missing("job id")),
                None => None,
            },
        };

        Ok((entry.build)(Resolved {
            value,
            notify: params.notify_tms,
        }))
    }
}

/// Job ids are free text but may not be blank or contain path separators.
fn is_valid_job_id(job_id: &str) -> bool {
    !job_id.trim().is_empty() && !job_id.contains(['/', '\\'])
}
