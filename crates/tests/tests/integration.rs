//! Integration tests for end-to-end lanes VM execution.
//!
//! These tests verify the full path:
//! Build program → Bind streams → Execute → Verify outputs

use lanes_simd::{Bits12, Bits23, Full, MathAcc, Vec4f};
use lanes_tests::{OUTPUT_SENTINEL, TestHarness, assert_close};
use lanes_vm::{
    Arity, BinaryOp, ByteCode, ByteCodeBuilder, ChunkConfig, ExecutionError, ExpressionVm,
    GlobalData, InputStream, OutputStream, StreamDataType, UnaryOp,
};

/// `[Load X -> r0; Mov r0 -> r1; Store r1 -> Y]`
fn identity_program() -> ByteCode {
    let mut builder = ByteCodeBuilder::new();
    builder.load(0, "X").mov(1, 0).store("Y", 1);
    builder.build()
}

/// Add-constant program: `Y = 5 + X`.
#[test]
fn test_add_constant_program() {
    let mut builder = ByteCodeBuilder::new();
    builder
        .load(0, "X")
        .binary_const(BinaryOp::Add, 1, 5.0, 0)
        .store("Y", 1);
    let program = builder.build();

    let mut harness = TestHarness::new();
    harness.input("X", vec![1.0, 2.0, 3.0, 4.0]);
    harness.run(&program, 4).unwrap();

    assert_eq!(harness.expect_output("Y"), &[6.0, 7.0, 8.0, 9.0]);
}

/// Missing input: the caller only supplies `Z`.
#[test]
fn test_missing_input_is_reported() {
    let mut harness = TestHarness::new();
    harness.input("Z", vec![1.0; 4]);

    let err = harness.run(&identity_program(), 4).unwrap_err();
    assert_eq!(err, ExecutionError::MissingInput("X".into()));
    assert!(harness.expect_output("Y").iter().all(|&v| v == OUTPUT_SENTINEL));
}

/// Tail safety: five instances, streams sized for exactly five elements.
///
/// The output view covers five elements of an eight element buffer; the
/// three elements past its end must keep their sentinel.
#[test]
fn test_tail_group_stays_inside_streams() {
    let program = identity_program();
    let x = [1.5f32, -2.5, 3.5, -4.5, 5.5];
    let mut backing = [OUTPUT_SENTINEL; 8];

    {
        let bytes: &[u8] = bytemuck::cast_slice(&x);
        assert_eq!(bytes.len(), 4 * 4 + 4);
        let inputs = [InputStream::new("X", bytes, 4, StreamDataType::Float)];
        let mut outputs = [OutputStream::from_f32("Y", &mut backing[..5])];
        let mut vm = ExpressionVm::new();
        vm.execute(&program, &inputs, &mut outputs, 5, &()).unwrap();
    }

    assert_eq!(&backing[..5], &x);
    assert_eq!(&backing[5..], &[OUTPUT_SENTINEL; 3]);
}

/// Function-call program: `Y = Double(X)`.
#[test]
fn test_function_call_program() {
    let mut builder = ByteCodeBuilder::new();
    builder.load(0, "X").call(1, "Double", &[0]).store("Y", 1);
    let program = builder.build();

    let mut harness = TestHarness::new();
    harness.vm_mut().register_function(
        "Double",
        Arity::Fixed(1),
        |args: &[&[Vec4f]], out: &mut [Vec4f], _: &GlobalData| {
            for (o, a) in out.iter_mut().zip(args[0]) {
                *o = *a * 2.0;
            }
        },
    );
    harness.input("X", vec![3.0]);
    harness.run(&program, 1).unwrap();

    assert_eq!(harness.expect_output("Y"), &[6.0]);
}

/// Division by zero produces IEEE infinity and is not an error.
#[test]
fn test_division_by_zero_yields_infinity() {
    let mut builder = ByteCodeBuilder::new();
    builder
        .load(0, "X")
        .binary_const(BinaryOp::Div, 1, 1.0, 0)
        .store("Y", 1);
    let program = builder.build();

    let mut harness = TestHarness::new();
    harness.input("X", vec![2.0, 0.0, 4.0, 8.0]);
    harness.run(&program, 4).unwrap();

    assert_eq!(harness.expect_output("Y"), &[0.5, f32::INFINITY, 0.25, 0.125]);
}

/// Unknown function: nothing registered under `Perlin3D`.
#[test]
fn test_unknown_function_is_reported() {
    let mut builder = ByteCodeBuilder::new();
    builder
        .load(0, "X")
        .call(1, "Perlin3D", &[0, 0, 0])
        .store("Y", 1);
    let program = builder.build();

    let mut harness = TestHarness::with_default_functions();
    harness.input("X", vec![0.0; 4]);
    let err = harness.run(&program, 4).unwrap_err();

    assert_eq!(err, ExecutionError::MissingFunction("Perlin3D".into()));
    assert!(harness.expect_output("Y").iter().all(|&v| v == OUTPUT_SENTINEL));
}

/// Load → Mov → Store reproduces every instance bit for bit.
#[test]
fn test_identity_round_trip_is_bit_exact() {
    let specials = [
        0.0f32,
        -0.0,
        f32::MIN_POSITIVE / 8.0,
        f32::MAX,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::NAN,
        1.0 / 3.0,
    ];
    let program = identity_program();

    for count in 1..=13 {
        let x: Vec<f32> = (0..count).map(|i| specials[i % specials.len()]).collect();
        let mut harness = TestHarness::new();
        harness.input("X", x.clone());
        harness.run(&program, count).unwrap();

        let bits = |values: &[f32]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(harness.expect_output("Y")), bits(&x), "count {count}");
    }
}

/// Two engines, same inputs, bit-identical outputs.
#[test]
fn test_execution_is_idempotent_across_engines() {
    let mut builder = ByteCodeBuilder::new();
    builder
        .load(0, "X")
        .unary(UnaryOp::Exp, 1, 0)
        .unary(UnaryOp::Ln, 2, 1)
        .unary(UnaryOp::Cos, 3, 0)
        .binary(BinaryOp::Mul, 2, 2, 3)
        .store("Y", 2);
    let program = builder.build();
    let x: Vec<f32> = (0..101).map(|i| i as f32 * 0.05 - 2.5).collect();

    let mut first = TestHarness::new();
    first.input("X", x.clone());
    first.run(&program, x.len()).unwrap();

    let mut second = TestHarness::new();
    second.input("X", x.clone());
    second.run(&program, x.len()).unwrap();
    second.run(&program, x.len()).unwrap();

    let bits = |values: &[f32]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(first.expect_output("Y")), bits(second.expect_output("Y")));
}

fn max_relative_div_error<A: MathAcc>(divisors: &[f32]) -> f64 {
    let dividend = Vec4f::splat(1.7);
    let exact_dividend = 1.7f32 as f64;
    divisors
        .chunks(4)
        .flat_map(|chunk| {
            let divisor = Vec4f::load::<4>(&[chunk[0], chunk[1], chunk[2], chunk[3]]);
            let quotient = dividend.comp_div::<A>(divisor).to_array();
            (0..4).map(move |lane| {
                let reference = exact_dividend / chunk[lane] as f64;
                ((quotient[lane] as f64 - reference) / reference).abs()
            })
        })
        .fold(0.0, f64::max)
}

/// Accuracy classes are ordered against a double precision reference.
#[test]
fn test_division_accuracy_classes_are_ordered() {
    let divisors: Vec<f32> = (1..=256).map(|i| (i as f32 * 0.731).sin() * 40.0 + 41.0).collect();

    let full = max_relative_div_error::<Full>(&divisors);
    let bits23 = max_relative_div_error::<Bits23>(&divisors);
    let bits12 = max_relative_div_error::<Bits12>(&divisors);

    assert!(full <= bits23, "full {full} > bits23 {bits23}");
    assert!(bits23 <= bits12, "bits23 {bits23} > bits12 {bits12}");
}

/// Validity checks hold only if every one of the first N lanes qualifies.
#[test]
fn test_validity_is_conjunction_over_lanes() {
    for position in 0..4 {
        let mut lanes = [1.0f32; 4];
        lanes[position] = f32::NAN;
        let v = Vec4f::from_array(lanes);

        assert!(!v.is_valid::<4>());
        assert!(!v.is_nan::<4>());
        assert_eq!(v.is_valid::<1>(), position != 0);
        assert_eq!(v.is_valid::<3>(), position == 3);
    }

    assert!(Vec4f::splat(f32::NAN).is_nan::<4>());
    assert!(Vec4f::new(f32::NAN, f32::NAN, 1.0, f32::NAN).is_nan::<2>());
    assert!(Vec4f::splat(2.0).is_valid::<4>());
}

/// Default functions are usable from programs and stay lane-wise under
/// chunked execution.
#[test]
fn test_default_functions_parallel_matches_serial() {
    let mut builder = ByteCodeBuilder::new();
    builder
        .load(0, "index")
        .mov_const(1, 7.0)
        .call(2, "Random", &[0, 1])
        .binary_const(BinaryOp::Mul, 3, 0.01, 0)
        .mov_const(4, 4.0)
        .call(5, "PerlinNoise", &[3, 2, 3, 4])
        .store("random", 2)
        .store("noise", 5);
    let program = builder.build();

    let count = 5003;
    let index: Vec<f32> = (0..count).map(|i| i as f32).collect();

    let mut serial = TestHarness::with_default_functions();
    serial.input("index", index.clone());
    serial.run(&program, count).unwrap();

    let config = ChunkConfig {
        chunk_size: 64,
        serial_threshold: 0,
        ..ChunkConfig::default()
    };
    let mut parallel = TestHarness::with_default_functions();
    parallel.input("index", index);
    parallel.run_parallel(&program, count, &config).unwrap();

    for name in ["random", "noise"] {
        let s = serial.expect_output(name);
        assert!(s.iter().all(|v| (0.0..=1.0).contains(v)), "{name} out of range");
        assert_eq!(
            s.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            parallel.expect_output(name).iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            "{name} differs"
        );
    }
}

/// Global data is validated once per call before anything runs.
#[test]
fn test_global_data_validation() {
    struct Settings {
        offset: f32,
    }

    let mut builder = ByteCodeBuilder::new();
    builder.load(0, "X").call(1, "Offset", &[0]).store("Y", 1);
    let program = builder.build();

    let mut harness = TestHarness::new();
    harness.vm_mut().register_function_with_validator(
        "Offset",
        Arity::Fixed(1),
        |args: &[&[Vec4f]], out: &mut [Vec4f], global_data: &GlobalData| {
            let offset = global_data
                .downcast_ref::<Settings>()
                .map_or(0.0, |settings| settings.offset);
            for (o, a) in out.iter_mut().zip(args[0]) {
                *o = *a + Vec4f::splat(offset);
            }
        },
        |global_data: &GlobalData| {
            if global_data.is::<Settings>() {
                Ok(())
            } else {
                Err("Settings required".to_string())
            }
        },
    );
    harness.input("X", vec![1.0, 2.0, 3.0]);

    let err = harness.run_with(&program, 3, &(), None).unwrap_err();
    assert!(matches!(err, ExecutionError::GlobalDataValidationFailed { .. }));

    harness
        .run_with(&program, 3, &Settings { offset: 0.5 }, None)
        .unwrap();
    assert_close(harness.expect_output("Y"), &[1.5, 2.5, 3.5], 0.0);
}

/// Undeclared outputs bound by the caller are left alone.
#[test]
fn test_extra_outputs_are_untouched() {
    let mut harness = TestHarness::new();
    harness.input("X", vec![1.0; 6]).extra_output("unused");
    harness.run(&identity_program(), 6).unwrap();

    assert_eq!(harness.expect_output("Y"), &[1.0; 6]);
    assert_eq!(harness.expect_output("unused"), &[OUTPUT_SENTINEL; 6]);
}

/// Disassembly shows instructions with resolved names.
#[test]
fn test_disassembly_of_built_program() {
    let text = identity_program().disassemble().unwrap();
    let lines: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(lines, vec!["0000: Load r0, in:X", "0003: Mov r1, r0", "0006: Store out:Y, r1"]);
}
