//! Benchmarks for comment parsing and reconciliation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nbonto::annotation::parse_semantic_comment;
use nbonto::engine::{Engine, EngineConfig};
use nbonto::namespace::Namespaces;
use nbonto::ontology::OntologyGraph;
use nbonto::reconcile::{reconcile, ReconcileContext};
use nbonto::value::ParamValue;

const CELL: &str = r#"# oda:WorkflowNotebook
src_name = "Crab"  # oda:AstrophysicalObject
ra = 83.63  # oda:RightAscension
dec = 22.01  # oda:Declination
e_min = 20  # oda:energyMin; oda:limits 15, 1000
radius: float | None = None  # oda:AngleDegrees
nbins = 10  # oda:NumberOfBins
"#;

fn bench_parse_comment(c: &mut Criterion) {
    let ns = Namespaces::default();

    c.bench_function("parse_comment_single_type", |bench| {
        bench.iter(|| black_box(parse_semantic_comment("oda:Float", true, &ns).unwrap()))
    });

    c.bench_function("parse_comment_with_limits", |bench| {
        bench.iter(|| {
            black_box(
                parse_semantic_comment("oda:energyMin; oda:limits 3, 30", true, &ns).unwrap(),
            )
        })
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let ns = Namespaces::default();
    let ontology = OntologyGraph::bundled().unwrap();
    let ctx = ReconcileContext::new(Some(&ontology), &ns);
    let annotation = parse_semantic_comment("oda:energyMin; oda:limits 3, 30", true, &ns).unwrap();

    c.bench_function("reconcile_known_type", |bench| {
        bench.iter(|| {
            black_box(
                reconcile(&ctx, &ParamValue::Int(25), None, Some("oda:Declination"), None)
                    .unwrap(),
            )
        })
    });

    c.bench_function("reconcile_synthesized_type", |bench| {
        bench.iter(|| {
            black_box(
                reconcile(
                    &ctx,
                    &ParamValue::Int(20),
                    Some("float"),
                    annotation.owl_type.as_deref(),
                    annotation.extra_ttl.as_deref(),
                )
                .unwrap(),
            )
        })
    });
}

fn bench_inspect_notebook(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();

    c.bench_function("inspect_notebook_6_params", |bench| {
        bench.iter(|| black_box(engine.inspect_notebook(CELL).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_parse_comment,
    bench_reconcile,
    bench_inspect_notebook
);
criterion_main!(benches);
