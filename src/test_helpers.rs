pub(crate) trait TestHelper {
    fn assert_approx_eq<const N: usize>(&self, b: [f32; N]);
}

impl<T: AsRef<[f32]>> TestHelper for T {
    fn assert_approx_eq<const N: usize>(&self, b: [f32; N]) {
        let a = self.as_ref();
        assert_eq!(a.len(), N, "length mismatch: {a:?} vs {b:?}");
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-4, "{a:?} != {b:?}");
        }
    }
}
