use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, ElectionId},
    db::{candidate::Candidate, election::Election},
};

/// A new election and its initial candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub title: String,
    #[serde(default)]
    pub candidates: Vec<CandidateSpec>,
}

impl ElectionSpec {
    /// Normalise and check the spec, returning the trimmed title and
    /// candidates in their given order.
    pub fn validated(self) -> Result<(String, Vec<NewCandidate>)> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidInput("Election title is empty".to_string()));
        }

        let candidates = self
            .candidates
            .into_iter()
            .map(|spec| NewCandidate::from(spec).validated())
            .collect::<Result<Vec<_>>>()?;
        let mut names = HashSet::new();
        for candidate in &candidates {
            if !names.insert(candidate.name.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "Candidate '{}' appears more than once",
                    candidate.name
                )));
            }
        }

        Ok((title, candidates))
    }
}

/// A candidate, given either as a bare name or in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateSpec {
    Name(String),
    Full(NewCandidate),
}

/// A candidate to be added to an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl NewCandidate {
    /// Trim the name and photo reference, rejecting an empty name.
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput("Candidate name is empty".to_string()));
        }
        let photo_url = self
            .photo_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        Ok(Self { name, photo_url })
    }
}

impl From<CandidateSpec> for NewCandidate {
    fn from(spec: CandidateSpec) -> Self {
        match spec {
            CandidateSpec::Name(name) => Self {
                name,
                photo_url: None,
            },
            CandidateSpec::Full(candidate) => candidate,
        }
    }
}

/// An election and its live candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    pub id: ElectionId,
    pub title: String,
    pub candidates: Vec<CandidateDescription>,
}

impl ElectionDescription {
    /// Describe an election. Removed candidates are left out.
    pub fn new(election: Election, candidates: impl IntoIterator<Item = Candidate>) -> Self {
        Self {
            id: election.id,
            title: election.title,
            candidates: candidates
                .into_iter()
                .filter(|c| !c.removed)
                .map(CandidateDescription::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: CandidateId,
    pub name: String,
    pub photo_url: Option<String>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            photo_url: candidate.photo_url,
        }
    }
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn candidates_may_be_bare_names() {
        let spec: ElectionSpec = serde_json::from_str(
            r#"{"title": "Board", "candidates": ["Ann", {"name": "Bo", "photo_url": "bo.png"}, {"name": "Cy"}]}"#,
        )
        .unwrap();
        let (title, candidates) = spec.validated().unwrap();
        assert_eq!(title, "Board");
        assert_eq!(
            candidates,
            vec![
                NewCandidate {
                    name: "Ann".to_string(),
                    photo_url: None
                },
                NewCandidate {
                    name: "Bo".to_string(),
                    photo_url: Some("bo.png".to_string())
                },
                NewCandidate {
                    name: "Cy".to_string(),
                    photo_url: None
                },
            ]
        );
    }

    #[test]
    fn names_are_trimmed() {
        let spec = ElectionSpec {
            title: "  Board ".to_string(),
            candidates: vec![CandidateSpec::Full(NewCandidate {
                name: " Ann\n".to_string(),
                photo_url: Some("  ".to_string()),
            })],
        };
        let (title, candidates) = spec.validated().unwrap();
        assert_eq!(title, "Board");
        assert_eq!(candidates[0].name, "Ann");
        assert_eq!(candidates[0].photo_url, None);
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let empty_title = ElectionSpec {
            title: " ".to_string(),
            ..ElectionSpec::example()
        };
        let empty_name = ElectionSpec {
            candidates: vec![CandidateSpec::Name(String::new())],
            ..ElectionSpec::example()
        };
        let duplicate = ElectionSpec {
            candidates: vec![
                CandidateSpec::Name("Ann".to_string()),
                CandidateSpec::Name(" Ann".to_string()),
            ],
            ..ElectionSpec::example()
        };
        for spec in [empty_title, empty_name, duplicate] {
            assert!(matches!(spec.validated(), Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn descriptions_omit_removed_candidates() {
        let election = Election {
            id: 1,
            title: "Board".to_string(),
        };
        let candidates = vec![
            Candidate {
                id: 1,
                election_id: 1,
                name: "Ann".to_string(),
                photo_url: None,
                removed: false,
            },
            Candidate {
                id: 2,
                election_id: 1,
                name: "Bo".to_string(),
                photo_url: None,
                removed: true,
            },
        ];
        let description = ElectionDescription::new(election, candidates);
        assert_eq!(description.candidates.len(), 1);
        assert_eq!(description.candidates[0].name, "Ann");
    }
}
