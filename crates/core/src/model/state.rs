//! Graphics, text, color and path state for the content-stream interpreter.

/// A 3x3 affine transform matrix, row-vector convention.
///
/// Points transform as `p' = p x M`, so the translation component lives in
/// the bottom row (`m[2][0]`, `m[2][1]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [[f64; 3]; 3]);

/// The identity matrix.
pub const MATRIX_IDENTITY: Matrix = Matrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

impl Matrix {
    /// Build a matrix from the six operands of `cm`/`Tm`.
    pub const fn from_operands(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self([[a, b, 0.0], [c, d, 0.0], [e, f, 1.0]])
    }

    /// Build a pure translation matrix.
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [tx, ty, 1.0]])
    }

    /// Matrix product `self x rhs`.
    pub fn mul(&self, rhs: &Matrix) -> Matrix {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in self.0.iter().enumerate() {
            for j in 0..3 {
                out[i][j] = row[0] * rhs.0[0][j] + row[1] * rhs.0[1][j] + row[2] * rhs.0[2][j];
            }
        }
        Matrix(out)
    }

    /// Translation component (x, y).
    pub const fn translation_xy(&self) -> (f64, f64) {
        (self.0[2][0], self.0[2][1])
    }

    /// Vertical scale factor: `sqrt(m[1][0]^2 + m[1][1]^2)`.
    pub fn scale_y(&self) -> f64 {
        (self.0[1][0] * self.0[1][0] + self.0[1][1] * self.0[1][1]).sqrt()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        MATRIX_IDENTITY
    }
}

/// Graphics state: the current transformation matrix.
///
/// A stack of these supports q/Q scoping; pushing copies the current top.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix (CTM)
    pub ctm: Matrix,
}

impl GraphicsState {
    pub const fn new() -> Self {
        Self {
            ctm: MATRIX_IDENTITY,
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Text state, reset at each BT operator.
#[derive(Debug, Clone)]
pub struct TextState {
    /// Text matrix (Tm)
    pub tm: Matrix,
    /// Text line matrix (Tlm)
    pub tlm: Matrix,
    /// Active font resource name (e.g. "F1")
    pub font: String,
    /// Font size in user units
    pub font_size: f64,
    /// Character spacing (Tc)
    pub char_spacing: f64,
    /// Word spacing (Tw)
    pub word_spacing: f64,
    /// Horizontal scaling percentage (Tz, 100 = normal)
    pub horizontal_scaling: f64,
    /// Text leading (TL)
    pub leading: f64,
    /// Text rise (Ts)
    pub rise: f64,
}

impl TextState {
    /// Defaults per the text object model: size 12, scaling 100%,
    /// zero spacing/leading/rise, identity matrices.
    pub fn new() -> Self {
        Self {
            tm: MATRIX_IDENTITY,
            tlm: MATRIX_IDENTITY,
            font: String::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
        }
    }

    /// Leading-based line break: `Tm = Tlm x translate(0, -leading)`,
    /// then `Tlm = Tm`. Used by T*, ' and ".
    pub fn next_line(&mut self) {
        self.tm = self.tlm.mul(&Matrix::translation(0.0, -self.leading));
        self.tlm = self.tm;
    }
}

impl Default for TextState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill and stroke colors as hex-encoded RGB strings (`#rrggbb`).
#[derive(Debug, Clone, Default)]
pub struct ColorState {
    pub stroke_color: String,
    pub fill_color: String,
}

/// Accumulated path description in an SVG-path-like mini-language
/// (`M x y`, `L x y`, `C x1 y1 x2 y2 x3 y3`, `Z`).
#[derive(Debug, Clone, Default)]
pub struct PathState {
    /// Last move-to point, in source space
    pub x: f64,
    pub y: f64,
    /// Accumulated path string, device space (origin top-left)
    pub path: String,
}

/// Collapse color operands to a `#rrggbb` string.
///
/// Three components are DeviceRGB. One component is gray, replicated to all
/// channels. Four or more use the first three - a documented approximation,
/// not a CMYK conversion. Empty input leaves the color unset.
pub fn components_to_hex(components: &[f64]) -> String {
    let (r, g, b) = match components {
        [] => return String::new(),
        [g] => (*g, *g, *g),
        [r, g, b, ..] => (*r, *g, *b),
        _ => return String::new(),
    };
    format!(
        "#{:02x}{:02x}{:02x}",
        (r * 255.0) as u8,
        (g * 255.0) as u8,
        (b * 255.0) as u8
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_mul_translation() {
        let t = Matrix::translation(5.0, 7.0);
        let m = MATRIX_IDENTITY.mul(&t);
        assert_eq!(m.translation_xy(), (5.0, 7.0));
    }

    #[test]
    fn test_next_line_applies_leading() {
        let mut ts = TextState::new();
        ts.leading = 14.0;
        ts.tm = Matrix::from_operands(1.0, 0.0, 0.0, 1.0, 100.0, 200.0);
        ts.tlm = ts.tm;
        ts.next_line();
        assert_eq!(ts.tm.translation_xy(), (100.0, 186.0));
        assert_eq!(ts.tlm.translation_xy(), (100.0, 186.0));
    }

    #[test]
    fn test_components_to_hex() {
        assert_eq!(components_to_hex(&[1.0, 0.0, 0.0]), "#ff0000");
        assert_eq!(components_to_hex(&[0.5]), "#7f7f7f");
        assert_eq!(components_to_hex(&[0.0, 0.0, 0.0, 1.0]), "#000000");
        assert_eq!(components_to_hex(&[]), "");
    }
}
