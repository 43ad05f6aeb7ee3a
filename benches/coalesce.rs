use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use pepatlas::coalesce::coalesce;
use pepatlas::model::{IdentificationRecord, ProteinAdjustment};
use pepatlas::pipeline::record_order;

/// Records for `num_peptides` peptides, each seen `per_peptide` times across ten experiments
fn generate_records(num_peptides: usize, per_peptide: usize) -> Vec<IdentificationRecord> {
    let mut records = Vec::with_capacity(num_peptides * per_peptide);
    for p in 0..num_peptides {
        let sequence = format!("PEPTIDE{:06}K", p);
        for k in 0..per_peptide {
            let experiment_id = (k % 10) as u32 + 1;
            let modified = if k % 3 == 0 {
                sequence.replacen('E', "E[129]", 1)
            } else {
                sequence.clone()
            };
            records.push(IdentificationRecord {
                experiment_id,
                spectrum_id: format!("run{}.{:05}.{:05}.2", experiment_id, p, k),
                peptide_accession: None,
                stripped_sequence: sequence.clone(),
                preceding_residue: "K".to_string(),
                modified_sequence: modified,
                following_residue: "A".to_string(),
                charge: Some(2 + (k % 2) as u8),
                probability: Some(0.9 + (k % 10) as f64 / 100.0),
                mass_difference: Some(0.001),
                protein_name: format!("PROT_{}", p % 500),
                adjustment: Some(ProteinAdjustment {
                    adjusted_probability: Some(0.99),
                    n_adjusted_observations: Some(per_peptide as u32),
                    n_sibling_peptides: Some(1.5),
                }),
            });
        }
    }
    records.sort_by(record_order);
    records
}

fn bench_coalesce(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalesce");

    for num_peptides in [1000, 10000] {
        let per_peptide = 8;
        let records = generate_records(num_peptides, per_peptide);

        group.throughput(Throughput::Elements((num_peptides * per_peptide) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_peptides), &records, |b, records| {
            b.iter_batched(
                || records.clone(),
                |records| {
                    let summaries = coalesce(records).unwrap();
                    black_box(summaries.len());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_sort_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_order");
    let mut records = generate_records(10000, 8);
    records.reverse();

    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("sort_80000", |b| {
        b.iter_batched(
            || records.clone(),
            |mut records| {
                records.sort_by(record_order);
                black_box(records.len());
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_coalesce, bench_sort_order);
criterion_main!(benches);
