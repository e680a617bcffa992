// Property tests for host overload selection.

use super::strategies::arb_types;
use proptest::prelude::*;
use wane::ffi::{match_candidate, select, Choice, DeclaredType, HostFunction, IntrinsicId, Overload, Param};
use wane::types::Type;
use wane::{LResult, Multi, Runtime, Value};

fn noop(_: &Runtime, _: &[Value]) -> LResult<Multi> {
    Ok(Multi::empty())
}

fn arb_declared() -> impl Strategy<Value = DeclaredType> {
    prop::sample::select(vec![
        DeclaredType::Any,
        DeclaredType::Nil,
        DeclaredType::Boolean,
        DeclaredType::Integer,
        DeclaredType::Float,
        DeclaredType::String,
        DeclaredType::Table,
        DeclaredType::Function,
    ])
}

fn arb_param() -> impl Strategy<Value = Param> {
    (arb_declared(), any::<bool>()).prop_map(|(ty, nullable)| {
        if nullable {
            Param::nullable(ty)
        } else {
            Param::of(ty)
        }
    })
}

fn arb_overload() -> impl Strategy<Value = Overload> {
    (
        prop::collection::vec(arb_param(), 0..4),
        any::<bool>(),
        prop::bool::weighted(0.2),
    )
        .prop_map(|(params, variadic, intrinsic)| {
            let mut o = Overload::new(params, noop);
            if variadic {
                o = o.with_variadic();
            }
            if intrinsic {
                o = o.with_intrinsic(IntrinsicId::Iteration);
            }
            o
        })
}

fn build(overloads: Vec<Overload>, fallback: bool) -> HostFunction {
    let builder = overloads
        .into_iter()
        .fold(HostFunction::builder("f"), |b, o| b.overload(o));
    let builder = if fallback {
        builder.overload(Overload::new([Param::of(DeclaredType::Any)], noop).with_variadic().as_fallback())
    } else {
        builder
    };
    builder.build().unwrap()
}

fn arb_intrinsic() -> impl Strategy<Value = Option<IntrinsicId>> {
    prop_oneof![Just(None), Just(Some(IntrinsicId::Iteration))]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn fallback_always_selects(
        overloads in prop::collection::vec(arb_overload(), 0..4),
        types in arb_types(5),
        intrinsic in arb_intrinsic(),
        megamorphic in any::<bool>(),
    ) {
        let f = build(overloads, true);
        prop_assert!(select(&f, &types, intrinsic, megamorphic).is_some());
    }

    #[test]
    fn chosen_overload_is_first_match(
        overloads in prop::collection::vec(arb_overload(), 1..5),
        types in arb_types(5),
        intrinsic in arb_intrinsic(),
    ) {
        let f = build(overloads, false);
        let first = f
            .overloads()
            .iter()
            .position(|o| match_candidate(o, &types, intrinsic).is_ok());
        match select(&f, &types, intrinsic, false) {
            Some(selection) => {
                prop_assert_eq!(selection.choice, Choice::Overload(first.unwrap()));
                let widen = match_candidate(&f.overloads()[first.unwrap()], &types, intrinsic).unwrap();
                prop_assert_eq!(selection.widen, widen);
            }
            None => prop_assert!(first.is_none()),
        }
    }

    #[test]
    fn widened_positions_hold_integers(
        overloads in prop::collection::vec(arb_overload(), 1..5),
        types in arb_types(5),
    ) {
        let f = build(overloads, false);
        if let Some(selection) = select(&f, &types, None, false) {
            for i in selection.widen {
                prop_assert_eq!(&types[i], &Type::Integer);
            }
        }
    }

    #[test]
    fn overloads_sorted_by_arity(overloads in prop::collection::vec(arb_overload(), 1..6)) {
        let f = build(overloads, false);
        let arities: Vec<usize> = f.overloads().iter().map(|o| o.params().len()).collect();
        prop_assert!(arities.windows(2).all(|w| w[0] >= w[1]), "{:?}", arities);
    }
}
