//! Fixed-size wire payloads.
//!
//! A [`Payload`] crosses the wire as exactly [`Payload::SIZE`] raw bytes in
//! the producer's native representation. Decoding the bytes a value encoded
//! to must yield a bit-identical value. Implementations are provided for the
//! primitive integers and floats and for fixed arrays of payloads; composite
//! types implement the trait field by field.

/// A value with a fixed wire size and a raw-bytes representation.
pub trait Payload: Copy + 'static {
    /// Exact number of bytes this type occupies on the wire.
    const SIZE: usize;

    /// Write the wire bytes into `out`, which holds at least `SIZE` bytes.
    fn write_to(&self, out: &mut [u8]);

    /// Rebuild a value from at least `SIZE` wire bytes.
    fn read_from(bytes: &[u8]) -> Self;
}

macro_rules! primitive_payload {
    ($($ty:ty),* $(,)?) => {$(
        impl Payload for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn write_to(&self, out: &mut [u8]) {
                out[..Self::SIZE].copy_from_slice(&self.to_ne_bytes());
            }

            fn read_from(bytes: &[u8]) -> Self {
                Self::from_ne_bytes(bytes[..Self::SIZE].try_into().unwrap())
            }
        }
    )*};
}

primitive_payload!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl<T: Payload, const N: usize> Payload for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn write_to(&self, out: &mut [u8]) {
        for (i, item) in self.iter().enumerate() {
            item.write_to(&mut out[i * T::SIZE..(i + 1) * T::SIZE]);
        }
    }

    fn read_from(bytes: &[u8]) -> Self {
        std::array::from_fn(|i| T::read_from(&bytes[i * T::SIZE..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Payload>(value: T) -> T {
        let mut bytes = vec![0u8; T::SIZE];
        value.write_to(&mut bytes);
        T::read_from(&bytes)
    }

    #[test]
    fn primitives_roundtrip_bit_identically() {
        assert_eq!(roundtrip(21.5f32), 21.5);
        assert_eq!(roundtrip(u64::MAX), u64::MAX);
        assert_eq!(roundtrip(-40i16), -40);
        // NaN payload bits survive: compare representations, not values.
        let nan = f64::from_bits(0x7FF8_0000_0000_1234);
        assert_eq!(roundtrip(nan).to_bits(), nan.to_bits());
    }

    #[test]
    fn arrays_concatenate_element_encodings() {
        let samples = [1.0f32, 2.5, -3.25];
        assert_eq!(<[f32; 3]>::SIZE, 12);
        assert_eq!(roundtrip(samples), samples);

        let mut bytes = vec![0u8; <[f32; 3]>::SIZE];
        samples.write_to(&mut bytes);
        assert_eq!(&bytes[4..8], &2.5f32.to_ne_bytes());
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Vec3 {
        x: f32,
        y: f32,
        z: f32,
    }

    impl Payload for Vec3 {
        const SIZE: usize = 12;

        fn write_to(&self, out: &mut [u8]) {
            self.x.write_to(&mut out[..4]);
            self.y.write_to(&mut out[4..8]);
            self.z.write_to(&mut out[8..12]);
        }

        fn read_from(bytes: &[u8]) -> Self {
            Self {
                x: f32::read_from(&bytes[..4]),
                y: f32::read_from(&bytes[4..8]),
                z: f32::read_from(&bytes[8..12]),
            }
        }
    }

    #[test]
    fn composite_payloads_roundtrip() {
        let v = Vec3 {
            x: 1.0,
            y: -2.0,
            z: 0.5,
        };
        assert_eq!(roundtrip(v), v);
    }
}
