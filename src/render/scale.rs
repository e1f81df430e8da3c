// Scale mappers
// Map bin indices to x positions and magnitudes to bar heights

/// Size of the drawing surface the bars are laid out on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChartDimensions {
    pub width: u32,
    pub height: u32,
}

impl ChartDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Domain parameters of the two scales, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    /// Upper bound of the bin index domain
    pub bin_max_index: u32,
    /// Upper bound of the magnitude domain
    pub magnitude_max: u32,
    /// Exponent of the magnitude power scale
    pub height_exponent: f64,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            bin_max_index: 1024,
            magnitude_max: 255,
            height_exponent: 4.0,
        }
    }
}

/// Linear interpolation from a domain onto a pixel range, rounded to the nearest pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> u32 {
        let t = normalize(value, self.domain.0, self.domain.1);
        interpolate_round(t, self.range)
    }
}

/// Power-law interpolation: `range * ((v^k - d0^k) / (d1^k - d0^k))`, rounded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowScale {
    exponent: f64,
    domain: (f64, f64),
    range: (f64, f64),
}

impl PowScale {
    pub fn new(exponent: f64, domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            exponent,
            domain,
            range,
        }
    }

    pub fn apply(&self, value: f64) -> u32 {
        let value = value.clamp(self.domain.0.min(self.domain.1), self.domain.0.max(self.domain.1));
        let t = normalize(
            signed_pow(value, self.exponent),
            signed_pow(self.domain.0, self.exponent),
            signed_pow(self.domain.1, self.exponent),
        );
        interpolate_round(t, self.range)
    }
}

/// The pair of scales used to lay out bars on a chart of a given size.
///
/// Built once per set of chart dimensions and handed to the reconciler; the
/// mappings themselves are pure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleConfig {
    dimensions: ChartDimensions,
    params: ScaleParams,
    x: LinearScale,
    y: PowScale,
}

impl ScaleConfig {
    pub fn new(dimensions: ChartDimensions, params: ScaleParams) -> Self {
        let x = LinearScale::new(
            (0.0, params.bin_max_index as f64),
            (0.0, dimensions.width as f64),
        );
        let y = PowScale::new(
            params.height_exponent,
            (0.0, params.magnitude_max as f64),
            (0.0, dimensions.height as f64),
        );

        Self {
            dimensions,
            params,
            x,
            y,
        }
    }

    /// Horizontal pixel position of a bin
    pub fn map_index_to_x(&self, index: usize) -> u32 {
        self.x.apply(index as f64)
    }

    /// Bar height in pixels for a magnitude
    pub fn map_magnitude_to_height(&self, magnitude: u8) -> u32 {
        self.y.apply(magnitude as f64).min(self.dimensions.height)
    }

    /// Width of a single bin slot
    pub fn bar_width(&self) -> u32 {
        self.map_index_to_x(1)
    }

    pub fn dimensions(&self) -> ChartDimensions {
        self.dimensions
    }

    pub fn params(&self) -> ScaleParams {
        self.params
    }
}

fn normalize(value: f64, d0: f64, d1: f64) -> f64 {
    let span = d1 - d0;
    if span == 0.0 || !span.is_finite() {
        return 0.0;
    }
    ((value - d0) / span).clamp(0.0, 1.0)
}

fn interpolate_round(t: f64, range: (f64, f64)) -> u32 {
    let value = range.0 + t * (range.1 - range.0);
    value.round().max(0.0) as u32
}

fn signed_pow(value: f64, exponent: f64) -> f64 {
    if value < 0.0 {
        -(-value).powf(exponent)
    } else {
        value.powf(exponent)
    }
}
