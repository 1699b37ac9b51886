//! Cue sheets — event lists authored in YAML and loaded onto a timeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timeline::Event;

/// One authored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Firing time in seconds.
    pub time: f64,
    pub id: i32,
    #[serde(default)]
    pub params: Vec<f64>,
}

/// A list of cues in authoring order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CueSheet {
    #[serde(default)]
    pub events: Vec<Cue>,
}

impl CueSheet {
    /// Parse and validate a cue sheet from YAML text.
    pub fn from_yaml(path: &Path, content: &str) -> Result<Self> {
        let sheet: CueSheet = serde_yaml::from_str(content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        sheet.validate()?;
        Ok(sheet)
    }

    /// Read, parse and validate a cue sheet file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(path, &content)
    }

    /// Reject non-finite times and params.
    pub fn validate(&self) -> Result<()> {
        for (index, cue) in self.events.iter().enumerate() {
            if !cue.time.is_finite() {
                return Err(Error::InvalidCue {
                    index,
                    reason: format!("time {} is not finite", cue.time),
                });
            }
            if let Some(p) = cue.params.iter().find(|p| !p.is_finite()) {
                return Err(Error::InvalidCue {
                    index,
                    reason: format!("param {p} is not finite"),
                });
            }
        }
        Ok(())
    }

    /// Number of cues.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the sheet has no cues.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Convert into events without dedicated callbacks.
    pub fn into_events(self) -> impl Iterator<Item = Event> {
        self.events
            .into_iter()
            .map(|cue| Event::new(cue.time, cue.id).with_params(cue.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::EventId;

    const SHEET: &str = r#"
events:
  - time: 4.5
    id: 200
  - time: 1.0
    id: 100
    params: [1.0]
  - time: 2.0
    id: 101
    params: [0.5, 2.0]
"#;

    #[test]
    fn parse_sheet() {
        let sheet = CueSheet::from_yaml(Path::new("cues.yaml"), SHEET).unwrap();
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.events[0].id, 200);
        assert!(sheet.events[0].params.is_empty());
        assert_eq!(sheet.events[2].params, vec![0.5, 2.0]);
    }

    #[test]
    fn into_events_keeps_authoring_order() {
        let sheet = CueSheet::from_yaml(Path::new("cues.yaml"), SHEET).unwrap();
        let events: Vec<Event> = sheet.into_events().collect();
        assert_eq!(events[1].id(), EventId(100));
        assert_eq!(events[1].params(), &[1.0]);
        assert!(events.iter().all(|e| !e.has_callback()));
    }

    #[test]
    fn empty_document_is_empty_sheet() {
        let sheet = CueSheet::from_yaml(Path::new("cues.yaml"), "{}").unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn non_finite_time_rejected() {
        let sheet = CueSheet {
            events: vec![
                Cue {
                    time: 1.0,
                    id: 1,
                    params: vec![],
                },
                Cue {
                    time: f64::NAN,
                    id: 2,
                    params: vec![],
                },
            ],
        };
        let err = sheet.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidCue { index: 1, .. }));
    }

    #[test]
    fn non_finite_param_rejected() {
        let yaml = "events:\n  - time: 1.0\n    id: 1\n    params: [.inf]\n";
        let err = CueSheet::from_yaml(Path::new("cues.yaml"), yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidCue { index: 0, .. }));
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let err = CueSheet::from_yaml(Path::new("broken.yaml"), "events: [").unwrap_err();
        assert!(err.to_string().starts_with("broken.yaml"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cues.yaml");
        std::fs::write(&path, SHEET).unwrap();
        assert_eq!(CueSheet::load(&path).unwrap().len(), 3);
    }
}
