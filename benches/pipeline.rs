use std::hint::black_box;

use chat_birthdays::{AnalysisConfig, analyze};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

/// A group of `members` chatting for `years`, celebrating each member once a year
fn generate_group_chat(members: usize, years: usize) -> String {
    let names: Vec<String> = (0..members).map(|i| format!("Member{:03}", i)).collect();
    let mut text = String::new();

    for year in 0..years {
        let yy = 20 + year;
        for (m, honoree) in names.iter().enumerate() {
            let month = m % 12 + 1;
            let day = m % 28 + 1;
            for k in 0..members.min(8) {
                let wisher = &names[(m + k + 1) % members];
                text.push_str(&format!(
                    "{}/{}/{}, 9:{:02} AM - {}: Happy birthday {} 🎉\n",
                    month, day, yy, k * 5, wisher, honoree
                ));
            }
            text.push_str(&format!("{}/{}/{}, 11:00 AM - {}: Thank you all!\n", month, day, yy, honoree));
            text.push_str(&format!("{}/{}/{}, 6:30 PM - {}: dinner plans anyone?\n", month, day, yy, wisher_name(&names, m)));
        }
    }
    text
}

fn wisher_name(names: &[String], m: usize) -> &str {
    &names[(m + 3) % names.len()]
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    let config = AnalysisConfig::default();

    for members in [10, 50, 200].iter() {
        let text = generate_group_chat(*members, 3);
        let lines = text.lines().count();

        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(members), members, |b, _| {
            b.iter(|| analyze(black_box(&text), &config).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
