use serde::Serialize;

/// Axis-aligned bounding rectangle in raster pixel coordinates.
/// `left`/`top` are the minimum corner.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl SymbolRect {
    /// Smallest rectangle enclosing every point. An empty point set yields a zero rectangle.
    pub fn bounding(points: impl IntoIterator<Item = (i32, i32)>) -> Self {
        let mut points = points.into_iter();
        let Some((x0, y0)) = points.next() else {
            return Self::default();
        };

        let (min_x, min_y, max_x, max_y) = points.fold((x0, y0, x0, y0), |acc, (x, y)| {
            (acc.0.min(x), acc.1.min(y), acc.2.max(x), acc.3.max(y))
        });

        Self {
            left: min_x,
            top: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

/// A symbol as reported by a [`super::SymbolDecoder`], before its payload is interpreted as text.
#[derive(Debug, Clone)]
pub struct RawSymbol {
    pub payload: Vec<u8>,
    pub symbol_type: String,
    pub rect: SymbolRect,
}

/// One located and decoded barcode, in the shape returned to clients.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DecodedSymbol {
    pub data: String,
    #[serde(rename = "type")]
    pub symbol_type: String,
    pub rect: SymbolRect,
}

impl TryFrom<RawSymbol> for DecodedSymbol {
    type Error = std::string::FromUtf8Error;

    fn try_from(raw: RawSymbol) -> Result<Self, Self::Error> {
        Ok(Self {
            data: String::from_utf8(raw.payload)?,
            symbol_type: raw.symbol_type,
            rect: raw.rect,
        })
    }
}
