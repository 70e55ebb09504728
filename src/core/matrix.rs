//! 2x3 affine transforms in content-stream element order.
//!
//! Matrices are stored as `[a b c d e f]`, the order the `cm` and `Tm`
//! operators take their operands in. A point maps as
//! `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.

/// A 2x3 affine transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Coefficients `[a b c d e f]`
    pub m: [f64; 6],
}

impl Matrix {
    /// The identity transform.
    pub const IDENTITY: Matrix = Matrix {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Create a matrix from its six coefficients.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Matrix {
            m: [a, b, c, d, e, f],
        }
    }

    /// Pure translation by (tx, ty).
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Pure scale by (sx, sy).
    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Matrix::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Counterclockwise rotation by `theta` radians.
    pub fn rotation(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Matrix::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// The vertical flip that maps Y-up user space onto a Y-down surface
    /// of the given height: `[1 0 0 -1 0 height]`.
    pub const fn flip_y(height: f64) -> Self {
        Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, height)
    }

    /// Concatenate `other` onto this matrix so that `other` applies first:
    /// the result maps `p` to `self(other(p))`.
    pub fn concat(&mut self, other: &Matrix) {
        let [a1, b1, c1, d1, e1, f1] = self.m;
        let [a2, b2, c2, d2, e2, f2] = other.m;
        self.m = [
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * e2 + c1 * f2 + e1,
            b1 * e2 + d1 * f2 + f1,
        ];
    }

    /// Concatenate a translation.
    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.concat(&Matrix::translation(tx, ty));
    }

    /// Concatenate a scale.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.concat(&Matrix::scaling(sx, sy));
    }

    /// Concatenate a rotation by `theta` radians.
    pub fn rotate(&mut self, theta: f64) {
        self.concat(&Matrix::rotation(theta));
    }

    /// Concatenate a shear: `x' = x + shx*y`, `y' = shy*x + y`.
    pub fn shear(&mut self, shx: f64, shy: f64) {
        self.concat(&Matrix::new(1.0, shy, shx, 1.0, 0.0, 0.0));
    }

    /// Apply the transform to a point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.m;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// The determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        let [a, b, c, d, _, _] = self.m;
        a * d - b * c
    }

    /// The uniform scale factor `sqrt(|det|)` used to rescale stroke
    /// attributes into device space.
    pub fn uniform_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Invert the transform, or `None` if it is singular or non-finite.
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let [a, b, c, d, e, f] = self.m;
        Some(Matrix::new(
            d / det,
            -b / det,
            -c / det,
            a / det,
            (c * f - d * e) / det,
            (b * e - a * f) / det,
        ))
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_identity_apply() {
        let (x, y) = Matrix::IDENTITY.apply(3.0, 4.0);
        assert_eq!((x, y), (3.0, 4.0));
    }

    #[test]
    fn test_translate_apply() {
        let mut m = Matrix::IDENTITY;
        m.translate(10.0, 20.0);
        assert_eq!(m.apply(1.0, 2.0), (11.0, 22.0));
    }

    #[test]
    fn test_concat_operand_applies_first() {
        // translate then scale: scaling concatenated last applies first
        let mut m = Matrix::translation(10.0, 0.0);
        m.scale(2.0, 2.0);
        // p -> translate(scale(p))
        assert_eq!(m.apply(3.0, 0.0), (16.0, 0.0));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let m = Matrix::rotation(std::f64::consts::FRAC_PI_2);
        let (x, y) = m.apply(1.0, 0.0);
        assert_close(x, 0.0);
        assert_close(y, 1.0);
    }

    #[test]
    fn test_determinant_and_uniform_scale() {
        let m = Matrix::scaling(2.0, 3.0);
        assert_close(m.determinant(), 6.0);
        assert_close(m.uniform_scale(), 6.0_f64.sqrt());

        // Rotation preserves lengths
        assert_close(Matrix::rotation(0.7).uniform_scale(), 1.0);
    }

    #[test]
    fn test_invert_round_trip() {
        let mut m = Matrix::translation(5.0, -3.0);
        m.scale(2.0, 4.0);
        m.rotate(0.3);
        let inv = m.invert().unwrap();

        let (x, y) = m.apply(7.0, 11.0);
        let (rx, ry) = inv.apply(x, y);
        assert_close(rx, 7.0);
        assert_close(ry, 11.0);
    }

    #[test]
    fn test_invert_singular() {
        assert!(Matrix::scaling(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_flip_y_round_trip() {
        let flip = Matrix::flip_y(792.0);
        assert_eq!(flip.apply(10.0, 0.0), (10.0, 792.0));
        assert_eq!(flip.apply(10.0, 792.0), (10.0, 0.0));
    }
}
