use smart_insole::calibration::{CalibrationModel, CalibrationTable, Segment};
use smart_insole::config::PipelineConfig;

fn model() -> CalibrationModel {
    CalibrationModel::from_config(&PipelineConfig::default())
}

#[test]
fn force_rises_with_adc_code() {
    let m = model();
    let mut previous = m.force(1);
    for raw in 2..4096u16 {
        let force = m.force(raw);
        assert!(force >= previous, "raw {raw}: {force} < {previous}");
        previous = force;
    }
}

#[test]
fn resolution_only_changes_the_code_scale() {
    let ten_bit = CalibrationModel {
        adc_range: 1024,
        ..model()
    };
    // Half scale at either resolution is the same divider voltage.
    assert_eq!(ten_bit.voltage(512), model().voltage(2048));
    assert_eq!(ten_bit.force(512), model().force(2048));
    assert!(ten_bit.force_checked(1024).is_none());
    assert!(ten_bit.force_checked(1023).is_some());
}

#[test]
fn half_scale_recovers_divider_resistance() {
    let m = model();
    assert_eq!(m.voltage(2048), 1.65);
    assert_eq!(m.resistance(2048), 9900.0);
    assert_eq!(m.table.segment(9900.0), Segment::High);
}

#[test]
fn zero_code_has_infinite_resistance() {
    assert!(model().resistance(0).is_infinite());
    assert_eq!(model().force_checked(0), None);
}

#[test]
fn table_is_replaceable() {
    let table = CalibrationTable {
        version: 2,
        breakpoint_ohms: 1000.0,
        low_offset: 0.0,
        low_slope: 0.000001,
        high_slope: 0.000001,
    };
    let m = CalibrationModel { table, ..model() };
    // r = 9900 > 1000: g / slope
    let expected = (1.0 / 9900.0f32) / 0.000001;
    assert_eq!(m.force(2048), expected);
    assert_eq!(CalibrationTable::default(), CalibrationTable::FSR_V1);
}

#[test]
fn low_segment_values() {
    let table = CalibrationTable::FSR_V1;
    let expected = (1.0 / 300.0f32 - 0.00075) / 0.00000032639;
    assert_eq!(table.force_for_resistance(300.0), expected);
    assert_eq!(table.segment(300.0), Segment::Low);
}
