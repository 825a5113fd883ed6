// Smart Insole - FSR Calibration
//
// Raw ADC code -> divider voltage -> sensor resistance -> conductance -> force.
// The sensor's force/conductance curve is two straight lines joined at a fixed
// resistance; the constants come from the datasheet curve fit and are carried
// as a versioned table so new calibration data replaces the table, not code.

/// Piecewise-linear force curve in conductance space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationTable {
    pub version: u16,
    /// Resistances at or below this use the low-resistance line.
    pub breakpoint_ohms: f32,
    /// Conductance offset of the low-resistance line (S).
    pub low_offset: f32,
    /// Conductance per unit force, low-resistance line.
    pub low_slope: f32,
    /// Conductance per unit force, high-resistance line.
    pub high_slope: f32,
}

impl CalibrationTable {
    pub const FSR_V1: Self = Self {
        version: 1,
        breakpoint_ohms: 600.0,
        low_offset: 0.00075,
        low_slope: 0.00000032639,
        high_slope: 0.000000642857,
    };

    /// Force for a known sensor resistance.
    pub fn force_for_resistance(&self, resistance: f32) -> f32 {
        let conductance = 1.0 / resistance;
        match self.segment(resistance) {
            Segment::Low => (conductance - self.low_offset) / self.low_slope,
            Segment::High => conductance / self.high_slope,
        }
    }

    pub fn segment(&self, resistance: f32) -> Segment {
        if resistance <= self.breakpoint_ohms {
            Segment::Low
        } else {
            Segment::High
        }
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::FSR_V1
    }
}

/// Which line of the calibration curve a resistance falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Low,
    High,
}

/// Voltage-divider front end plus calibration table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationModel {
    pub vcc: f32,
    pub divider_resistance: f32,
    /// Number of ADC codes, e.g. 4096 for 12 bits.
    pub adc_range: u32,
    pub min_plausible_raw: u16,
    pub table: CalibrationTable,
}

impl CalibrationModel {
    pub fn from_config(config: &crate::config::PipelineConfig) -> Self {
        Self {
            vcc: config.vcc,
            divider_resistance: config.divider_resistance,
            adc_range: config.adc_range,
            min_plausible_raw: config.min_plausible_raw,
            table: config.calibration,
        }
    }

    pub fn voltage(&self, raw: u16) -> f32 {
        self.vcc * raw as f32 / self.adc_range as f32
    }

    /// Sensor resistance recovered from the divider. Infinite for a zero code.
    pub fn resistance(&self, raw: u16) -> f32 {
        let v = self.voltage(raw);
        self.divider_resistance * (self.vcc / v - 1.0)
    }

    /// A code the divider can map to a finite, positive resistance: above the
    /// noise floor and below full scale (full scale means zero ohms).
    pub fn is_plausible(&self, raw: u16) -> bool {
        raw >= self.min_plausible_raw.max(1) && (raw as u32) < self.adc_range
    }

    /// Unchecked conversion. Callers filter with [`is_plausible`] first; a
    /// zero code divides by zero volts.
    ///
    /// [`is_plausible`]: CalibrationModel::is_plausible
    pub fn force(&self, raw: u16) -> f32 {
        debug_assert!(raw != 0, "zero ADC code must be filtered before calibration");
        self.table.force_for_resistance(self.resistance(raw))
    }

    pub fn force_checked(&self, raw: u16) -> Option<f32> {
        self.is_plausible(raw).then(|| self.force(raw))
    }
}
