use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emu_chip8::{Chip8System, Machine};
use emu_core::System;

/// Arithmetic loop with a sprite draw and a BCD store per iteration
fn bench_program() -> Vec<u8> {
    let words: [u16; 9] = [
        0x6105, // LD V1, 5
        0x7101, // ADD V1, 1
        0x8214, // ADD V2, V1
        0x8326, // SHR V3
        0xA300, // LD I, 0x300
        0xF233, // LD B, V2
        0xF029, // LD F, V0
        0xD125, // DRW V1, V2, 5
        0x1202, // JP 0x202
    ];
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn loaded_machine() -> Machine {
    let mut machine = Machine::with_seed(0);
    machine
        .load(&bench_program())
        .expect("bench program fits in memory");
    machine
}

fn bench_machine_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("chip8_step");

    group.bench_function("single_instruction", |b| {
        let mut machine = loaded_machine();
        b.iter(|| {
            machine.step().expect("bench program does not fault");
            black_box(machine.pc());
        });
    });

    group.finish();
}

fn bench_machine_multiple_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("chip8_multiple_steps");

    for step_count in [11, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(step_count),
            step_count,
            |b, &count| {
                b.iter(|| {
                    let mut machine = loaded_machine();
                    for _ in 0..count {
                        machine.step().expect("bench program does not fault");
                    }
                    black_box(machine.registers()[2]);
                });
            },
        );
    }

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    c.bench_function("chip8_step_frame", |b| {
        let mut system = Chip8System::with_seed(0);
        system
            .mount("Program", &bench_program())
            .expect("bench program fits in memory");
        b.iter(|| {
            let frame = system.step_frame().expect("bench program does not fault");
            black_box(frame.pixels[0]);
        });
    });
}

fn bench_snapshot(c: &mut Criterion) {
    c.bench_function("chip8_capture_restore", |b| {
        let mut machine = loaded_machine();
        for _ in 0..50 {
            machine.step().expect("bench program does not fault");
        }
        b.iter(|| {
            let snapshot = machine.capture();
            machine.restore(black_box(&snapshot));
        });
    });
}

criterion_group!(
    benches,
    bench_machine_step,
    bench_machine_multiple_steps,
    bench_frame,
    bench_snapshot
);
criterion_main!(benches);
