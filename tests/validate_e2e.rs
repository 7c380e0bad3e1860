use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use lexcheck::{
    parse, ConflictType, Constraint, ConstraintKind, ConstraintService, Config, Provenance, SolveStatus,
    SolverConfig, SolverError, VarisatEngine,
};

fn constraint(id: &str, kind: ConstraintKind, logic: &str, title: &str) -> Constraint {
    let symbols: Vec<String> = parse(logic)
        .unwrap()
        .symbols()
        .into_iter()
        .map(str::to_string)
        .collect();
    Constraint::builder()
        .id(id)
        .kind(kind)
        .variables(symbols)
        .logic_form(logic)
        .natural_language(format!("{id} holds"))
        .provenance(Provenance::new(id, title))
        .build()
        .unwrap()
}

fn service() -> ConstraintService {
    ConstraintService::offline(&Config::default())
}

#[test]
fn contradiction_names_both_constraints() {
    let batch = [
        constraint("c1", ConstraintKind::Assertion, "X == True", "Smith 302"),
        constraint("c2", ConstraintKind::Negation, "X == False", "Jones 302"),
    ];
    let result = service().validate_consistency(&batch, false);

    assert!(!result.satisfiable);
    assert_eq!(result.status, SolveStatus::Unsat);
    assert_eq!(result.unsat_core, Some(vec!["c1".to_string(), "c2".to_string()]));

    let conflicts = result.conflicts.unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].conflict_type, ConflictType::DirectContradiction);
    assert!(conflicts[0].explanation.contains("Smith 302"));
    assert!(conflicts[0].explanation.contains("Jones 302"));
}

#[test]
fn core_excludes_uninvolved_constraints() {
    let batch = [
        constraint("a", ConstraintKind::Assertion, "p == True", "A"),
        constraint("b", ConstraintKind::Implication, "Implies(p, q)", "B"),
        constraint("c", ConstraintKind::Assertion, "r == True", "C"),
        constraint("d", ConstraintKind::Negation, "q == False", "D"),
    ];
    let result = service().validate_consistency(&batch, false);
    assert_eq!(result.status, SolveStatus::Unsat);

    let core = result.unsat_core.unwrap();
    assert!(!core.contains(&"c".to_string()));
    assert!(core.iter().all(|id| ["a", "b", "d"].contains(&id.as_str())));

    // pairs are explained heuristically; three members yield three pairs
    assert_eq!(result.conflicts.unwrap().len(), core.len() * (core.len() - 1) / 2);
}

#[test]
fn model_satisfies_every_constraint() {
    let batch = [
        constraint("a", ConstraintKind::Implication, "Implies(met, knew_name)", "A"),
        constraint("b", ConstraintKind::Assertion, "met == True", "B"),
        constraint("c", ConstraintKind::Exclusion, "Not(And(knew_name, lied))", "C"),
        constraint("d", ConstraintKind::Equivalence, "Or(And(x, y), And(Not(x), Not(y)))", "D"),
        constraint("e", ConstraintKind::Assertion, "y != False", "E"),
    ];
    let result = service().validate_consistency(&batch, false);
    assert!(result.satisfiable);

    let model = result.model.unwrap();
    for c in &batch {
        let expr = parse(&c.logic_form).unwrap();
        assert_eq!(expr.eval(&model), Some(true), "{} violated by {model:?}", c.id);
    }
    assert_eq!(model.get("lied"), Some(&false));
    assert_eq!(model.get("x"), Some(&true));
}

#[test]
fn no_hard_constraints_is_satisfiable() {
    let mut a = constraint("a", ConstraintKind::Assertion, "x == True", "A");
    let mut b = constraint("b", ConstraintKind::Negation, "x == False", "B");
    a.is_hard = false;
    b.is_hard = false;

    let result = service().validate_consistency(&[a.clone(), b.clone()], false);
    assert!(result.satisfiable);
    assert_eq!(result.model, Some(BTreeMap::new()));

    let result = service().validate_consistency(&[a, b], true);
    assert!(!result.satisfiable);
}

#[test]
fn self_contradiction_is_reported_alone() {
    let batch = [
        constraint("ok", ConstraintKind::Assertion, "y == True", "A"),
        constraint("bad", ConstraintKind::Assertion, "And(x, Not(x))", "B"),
    ];
    let result = service().validate_consistency(&batch, false);
    assert_eq!(result.unsat_core, Some(vec!["bad".to_string()]));

    let conflicts = result.conflicts.unwrap();
    assert_eq!(conflicts[0].conflict_type, ConflictType::SelfContradiction);
    assert_eq!(conflicts[0].constraint_a.id, "bad");
    assert_eq!(conflicts[0].constraint_b.id, "bad");
}

#[test]
fn unparseable_constraint_is_dropped_not_fatal() {
    let mut bad = constraint("bad", ConstraintKind::Assertion, "x == True", "A");
    bad.logic_form = "__import__('os').system('true')".to_string();
    let batch = [bad, constraint("good", ConstraintKind::Assertion, "x == True", "B")];

    let result = service().validate_consistency(&batch, false);
    assert!(result.satisfiable);
    assert_eq!(result.dropped.len(), 1);
    assert_eq!(result.dropped[0].id, "bad");
}

#[test]
fn overly_nested_constraint_is_dropped() {
    let mut deep = constraint("deep", ConstraintKind::Assertion, "x == True", "A");
    deep.logic_form = format!("{}x{}", "Not(".repeat(50_000), ")".repeat(50_000));
    let batch = [deep, constraint("good", ConstraintKind::Assertion, "y == True", "B")];

    let result = service().validate_consistency(&batch, false);
    assert!(result.satisfiable);
    assert_eq!(result.dropped.len(), 1);
    assert_eq!(result.dropped[0].id, "deep");
    assert!(result.dropped[0].reason.contains("deeper than"));
}

/// `holes + 1` pigeons into `holes` holes.
fn pigeonhole(holes: usize) -> Vec<Constraint> {
    let mut out = Vec::new();
    for p in 0..=holes {
        let slots: Vec<String> = (0..holes).map(|h| format!("p{p}_h{h}")).collect();
        out.push(constraint(
            &format!("pigeon_{p}"),
            ConstraintKind::Assertion,
            &format!("Or({})", slots.join(", ")),
            "Pigeons",
        ));
    }
    for h in 0..holes {
        for a in 0..=holes {
            for b in (a + 1)..=holes {
                out.push(constraint(
                    &format!("hole_{h}_{a}_{b}"),
                    ConstraintKind::Exclusion,
                    &format!("Not(And(p{a}_h{h}, p{b}_h{h}))"),
                    "Holes",
                ));
            }
        }
    }
    out
}

#[test]
fn solver_timeout_surfaces_as_unknown() {
    let engine = VarisatEngine::new(&SolverConfig {
        timeout: Duration::from_millis(1),
        ..SolverConfig::default()
    });
    let service = service().with_engine(Arc::new(engine));

    let result = service.validate_consistency(&pigeonhole(10), false);
    assert_eq!(result.status, SolveStatus::Unknown);
    assert!(!result.satisfiable);
    assert!(result.model.is_none() && result.unsat_core.is_none() && result.conflicts.is_none());
    assert!(result.explanation.contains("timed out"), "{}", result.explanation);
}

#[test]
fn clause_limit_surfaces_as_unknown() {
    let engine = VarisatEngine::new(&SolverConfig {
        timeout: Duration::from_secs(5),
        max_clauses: 3,
        ..SolverConfig::default()
    });
    let service = service().with_engine(Arc::new(engine));
    let batch = [
        constraint("a", ConstraintKind::Implication, "Implies(p, q)", "A"),
        constraint("b", ConstraintKind::Implication, "Implies(q, r)", "B"),
    ];

    let result = service.validate_consistency(&batch, false);
    assert_eq!(result.status, SolveStatus::Unknown);
    assert!(!result.satisfiable);
    assert!(result.model.is_none() && result.unsat_core.is_none());
    assert!(result.explanation.contains("too complex"));

    let err = SolverError::ResourceLimit { clauses: 8, max_clauses: 3 };
    assert!(err.to_string().contains("exceeds limit"));
}

#[test]
fn ids_are_scoped_per_call() {
    let service = Arc::new(service());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                let value = if i % 2 == 0 { "True" } else { "False" };
                let batch = [
                    constraint("c1", ConstraintKind::Assertion, &format!("x == {value}"), "A"),
                    constraint("c2", ConstraintKind::Assertion, &format!("y == {value}"), "B"),
                ];
                service.validate_consistency(&batch, false)
            })
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert!(result.satisfiable);
    }
}
