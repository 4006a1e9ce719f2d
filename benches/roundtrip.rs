// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use criterion::{criterion_group, criterion_main, Criterion};
use fory_core::resolver::type_resolver::FieldDescriptor;
use fory_core::resolver::Registration;
use fory_core::types::type_id;
use fory_core::{Fory, ForyBuilder, Value};

fn sample_payload(fory: &mut Fory) -> Value {
    let id = fory
        .register(
            Registration::by_name("bench", "Record").with_fields(vec![
                FieldDescriptor {
                    name: "id".into(),
                    type_id: Some(type_id::INT64 as i32),
                    canonical_type: "int64".into(),
                },
                FieldDescriptor {
                    name: "tags".into(),
                    type_id: Some(type_id::MAP as i32),
                    canonical_type: "map".into(),
                },
            ]),
        )
        .unwrap();

    let mut entries = Vec::new();
    for i in 0..64i64 {
        entries.push((Value::I64(i), Value::F64(i as f64 * 1.5)));
    }
    Value::struct_value(
        id,
        vec![("id".to_string(), Value::I64(7)), ("tags".to_string(), Value::map(entries))],
    )
}

fn roundtrip_benchmark(c: &mut Criterion) {
    let mut fory = ForyBuilder::new().build();
    let payload = sample_payload(&mut fory);

    c.bench_function("serialize struct+map", |b| {
        b.iter(|| fory.serialize(&payload).unwrap())
    });

    let bytes = fory.serialize(&payload).unwrap();
    let mut reader = ForyBuilder::new().build();
    sample_payload(&mut reader); // register the same schema on the reader
    c.bench_function("deserialize struct+map", |b| {
        b.iter(|| reader.deserialize(bytes.clone(), None).unwrap())
    });
}

criterion_group!(benches, roundtrip_benchmark);
criterion_main!(benches);
