use crate::process::FieldValue;

/// Employment sector of an employed person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    Formal = 1,
    Informal = 2,
    DomesticService = 3,
    Other = 4,
}

impl Sector {
    /// Map a numeric sector code; anything unparsable or unknown is `Other`.
    pub fn from_code(code: FieldValue) -> Sector {
        match code.value().map(f64::trunc) {
            Some(v) if v == 1.0 => Sector::Formal,
            Some(v) if v == 2.0 => Sector::Informal,
            Some(v) if v == 3.0 => Sector::DomesticService,
            _ => Sector::Other,
        }
    }
}

const DOMESTIC_WORKER: i64 = 10;
const SIZE_SMALL: i64 = 1;
const SIZE_LARGE: i64 = 2;
const HAS_TAX_ID: i64 = 1;

/// Sectors straight from a recorded sector column.
pub fn sectors_from_codes(codes: &[FieldValue]) -> Vec<Sector> {
    codes.iter().copied().map(Sector::from_code).collect()
}

/// Per-row pick of the first condition that holds, else `default`.
fn select(conditions: &[(Vec<bool>, Sector)], default: Sector, len: usize) -> Vec<Sector> {
    (0..len)
        .map(|row| {
            conditions
                .iter()
                .find(|(mask, _)| mask[row])
                .map_or(default, |(_, sector)| *sector)
        })
        .collect()
}

/// Derive sectors from establishment size, tax registration and the
/// domestic-worker flag. Precedence: domestic flag, then size, then tax ID.
pub fn derive_sectors(
    size: &[FieldValue],
    tax: &[FieldValue],
    domestic: &[FieldValue],
) -> Vec<Sector> {
    let len = size.len();
    let mask = |col: &[FieldValue], code: i64| -> Vec<bool> {
        col.iter().map(|v| v.is_code(code)).collect()
    };

    let domestic_mask = mask(domestic, DOMESTIC_WORKER);
    let large = mask(size, SIZE_LARGE);
    let small = mask(size, SIZE_SMALL);
    let registered = mask(tax, HAS_TAX_ID);

    let small_registered: Vec<bool> = small.iter().zip(&registered).map(|(s, r)| *s && *r).collect();
    let small_unregistered: Vec<bool> = small.iter().zip(&registered).map(|(s, r)| *s && !*r).collect();

    select(
        &[
            (domestic_mask, Sector::DomesticService),
            (large, Sector::Formal),
            (small_registered, Sector::Formal),
            (small_unregistered, Sector::Informal),
        ],
        Sector::Other,
        len,
    )
}
