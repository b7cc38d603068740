use crate::{
    errors::errors::{Error, ErrorImpl},
    types::types::InternalType,
};

use super::{decls::{FuncId, Signature}, operators::Intrinsic};

/// What a resolved call dispatches to.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Function(FuncId),
    Intrinsic(Intrinsic),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub signature: Signature,
    pub return_type: InternalType,
    pub callee: Callee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchResult {
    Exact,
    Sufficient,
    Insufficient,
}

/// Every function sharing one name within a namespace or type.
#[derive(Debug, Clone, PartialEq)]
pub struct OverloadList {
    pub name: String,
    candidates: Vec<Candidate>,
}

impl OverloadList {
    pub fn new(name: &str) -> Self {
        OverloadList {
            name: name.to_string(),
            candidates: vec![],
        }
    }

    pub fn single(name: &str, candidate: Candidate) -> Self {
        OverloadList {
            name: name.to_string(),
            candidates: vec![candidate],
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Adds a candidate, rejecting one whose parameters duplicate an
    /// existing candidate's.
    pub fn add(&mut self, candidate: Candidate) -> Result<(), Error> {
        if self
            .candidates
            .iter()
            .any(|existing| existing.signature.same_params(&candidate.signature))
        {
            return Err(Error::unpositioned(ErrorImpl::AlreadyDeclared {
                name: format!("{}{}", self.name, candidate.signature.param_list()),
            }));
        }

        self.candidates.push(candidate);
        Ok(())
    }

    /// Picks the candidate for a call with `arguments`.
    ///
    /// The first exact match wins outright. Otherwise a single sufficient
    /// match wins; two or more are ambiguous and none is an error.
    pub fn get(&self, arguments: &[InternalType]) -> Result<&Candidate, Error> {
        let mut sufficient = None;
        let mut has_multiple_candidates = false;

        for candidate in &self.candidates {
            match compare_params(&candidate.signature, arguments) {
                MatchResult::Exact => return Ok(candidate),
                MatchResult::Sufficient => {
                    if sufficient.is_some() {
                        has_multiple_candidates = true;
                    }

                    sufficient = Some(candidate);
                }
                MatchResult::Insufficient => {}
            }
        }

        let Some(candidate) = sufficient else {
            return Err(Error::unpositioned(ErrorImpl::NoCandidate {
                name: self.name.clone(),
            }));
        };

        if has_multiple_candidates {
            return Err(Error::unpositioned(ErrorImpl::AmbiguousCall {
                name: self.name.clone(),
            }));
        }

        Ok(candidate)
    }
}

fn compare_params(definition: &Signature, call: &[InternalType]) -> MatchResult {
    if definition.is_variadic {
        if definition.params.len() > call.len() {
            return MatchResult::Insufficient;
        }
    } else if definition.params.len() != call.len() {
        return MatchResult::Insufficient;
    }

    let pairs = definition.params.iter().zip(call.iter());

    if pairs.clone().all(|(param, argument)| param == argument) {
        MatchResult::Exact
    } else if pairs.clone().all(|(param, argument)| argument.can_convert_to(param)) {
        MatchResult::Sufficient
    } else {
        MatchResult::Insufficient
    }
}
