// THEORY:
// The `Pixel` module is the smallest unit of the engine: a "dumb" container for
// one RGBA sample read out of a flat byte buffer. The only behaviour it owns is
// opacity resolution, because every place that reads a single source pixel must
// flatten partial transparency against the same white backdrop. If two code
// paths resolved alpha differently, a half-transparent image would produce
// different colors in the blur and no-blur branches.

pub mod pixel {
    pub type Byte = u8;
    pub type Bytes = Vec<Byte>;
    pub type Channel = Byte;

    pub const CHANNELS: usize = 4;
    pub const OPAQUE: Channel = 255;
    const BACKDROP: f64 = 255.0;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        pub fn rgb(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel::new(red, green, blue, OPAQUE)
        }

        /// Reads four consecutive bytes starting at `offset`.
        /// Returns `None` when the buffer does not hold a whole pixel there.
        pub fn read(buffer: &[Byte], offset: usize) -> Option<Self> {
            let bytes = buffer.get(offset..offset.checked_add(CHANNELS)?)?;
            Some(Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3]))
        }

        pub fn is_opaque(&self) -> bool {
            self.alpha == OPAQUE
        }

        /// Composites the pixel onto a white backdrop.
        ///
        /// `channel' = channel * a + 255 * (1 - a)` with `a = alpha / 255`, and the
        /// result always has alpha 255. Opaque pixels come back untouched.
        pub fn opaque(self) -> Self {
            if self.is_opaque() {
                return self;
            }
            let coverage = self.alpha as f64 / 255.0;
            let blend = |channel: Channel| -> Channel {
                (channel as f64 * coverage + BACKDROP * (1.0 - coverage))
                    .round()
                    .clamp(0.0, 255.0) as Channel
            };
            Pixel::rgb(blend(self.red), blend(self.green), blend(self.blue))
        }

        pub fn to_bytes(self) -> [Byte; CHANNELS] {
            [self.red, self.green, self.blue, self.alpha]
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from(bytes: [Byte; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            pixel.to_bytes().to_vec()
        }
    }
}
