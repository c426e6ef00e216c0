use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vns::catalog::Catalog;
use vns::logger::Logger;
use vns::script::lexer::tokenize;
use vns::script::parse_script;

fn make_scene(repeats: usize) -> String {
    let chunk = "\
:scene{n}|Scene {n}
[var mood{n}=\"{n} * 2\"]
The rain kept falling.[l][r]
@wait time=250
[if exp=\"mood{n} > 10\"]She smiled.[elif exp=\"mood{n} > 4\"]She nodded.[else]Nothing.[endif][r]
[font color=0x336699 bold=true]\\[narration\\][resetfont][cm]
";
    (0..repeats)
        .map(|n| chunk.replace("{n}", &n.to_string()))
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let small = make_scene(10);
    let med = make_scene(100);
    let large = make_scene(1000);
    let catalog = Catalog::new();

    let mut g = c.benchmark_group("script_parse");

    for (name, src) in [("small", &small), ("med", &med), ("large", &large)] {
        g.bench_function(format!("tokenize_{name}"), |b| {
            b.iter(|| tokenize(black_box(src)))
        });
        g.bench_function(format!("parse_{name}"), |b| {
            b.iter(|| {
                let mut logger = Logger::new();
                parse_script(black_box(src), &mut logger, &catalog)
            })
        });
    }

    g.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
