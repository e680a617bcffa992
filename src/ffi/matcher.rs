//! Overload matching against runtime argument types

use super::function::{DeclaredType, HostFunction, Overload};
use super::IntrinsicId;
use crate::types::Type;
use smallvec::SmallVec;
use thiserror::Error;

/// Which overload of a host function a site should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Index into [`HostFunction::overloads`].
    Overload(usize),
    Fallback,
}

/// A matched overload plus the argument positions that need an
/// Integer to Float widening before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub choice: Choice,
    pub widen: SmallVec<[usize; 4]>,
}

/// Why a candidate does not accept the argument types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Mismatch {
    #[error("too few arguments: {required} required, {given} given")]
    TooFewArguments { required: usize, given: usize },
    #[error("too many arguments: {declared} declared, {given} given")]
    TooManyArguments { declared: usize, given: usize },
    #[error("argument {position}: expected {expected}, found {found}")]
    Argument {
        position: usize,
        expected: DeclaredType,
        found: Type,
    },
    #[error("overload is reserved for intrinsic {0:?}")]
    Intrinsic(IntrinsicId),
}

/// Match one candidate. On success, returns the positions to widen.
pub fn match_candidate(
    candidate: &Overload,
    types: &[Type],
    intrinsic: Option<IntrinsicId>,
) -> Result<SmallVec<[usize; 4]>, Mismatch> {
    if let Some(id) = candidate.intrinsic() {
        if intrinsic != Some(id) {
            return Err(Mismatch::Intrinsic(id));
        }
    }

    let params = candidate.params();
    let required = if candidate.is_variadic() {
        params.len().saturating_sub(1)
    } else {
        params.len()
    };
    if types.len() < required {
        return Err(Mismatch::TooFewArguments {
            required,
            given: types.len(),
        });
    }
    if !candidate.is_variadic() && types.len() > params.len() {
        return Err(Mismatch::TooManyArguments {
            declared: params.len(),
            given: types.len(),
        });
    }

    let mut widen = SmallVec::new();
    for (position, ty) in types.iter().enumerate() {
        // past the end only for a variadic tail; no parameters takes anything
        let Some(param) = params.get(position).or(params.last()) else {
            break;
        };
        if param.ty.accepts(ty) || (param.nullable && matches!(ty, Type::Nil)) {
            continue;
        }
        if param.ty == DeclaredType::Float && matches!(ty, Type::Integer) {
            widen.push(position);
            continue;
        }
        return Err(Mismatch::Argument {
            position,
            expected: param.ty,
            found: ty.clone(),
        });
    }
    Ok(widen)
}

/// Pick the overload of `function` for argument `types`.
///
/// A megamorphic site tries the fallback before anything else.
pub fn select(
    function: &HostFunction,
    types: &[Type],
    intrinsic: Option<IntrinsicId>,
    megamorphic: bool,
) -> Option<Selection> {
    let fallback = || {
        function.fallback().and_then(|o| {
            match_candidate(o, types, intrinsic)
                .ok()
                .map(|widen| Selection {
                    choice: Choice::Fallback,
                    widen,
                })
        })
    };
    if megamorphic {
        if let Some(selection) = fallback() {
            return Some(selection);
        }
    }
    function
        .overloads()
        .iter()
        .enumerate()
        .find_map(|(i, candidate)| {
            match_candidate(candidate, types, intrinsic)
                .ok()
                .map(|widen| Selection {
                    choice: Choice::Overload(i),
                    widen,
                })
        })
        .or_else(|| if megamorphic { None } else { fallback() })
}
