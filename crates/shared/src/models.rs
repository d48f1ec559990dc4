use serde::{Deserialize, Serialize};

/// Unit name that marks a medic at a location instead of a unit icon.
pub const MEDIC_UNIT: &str = "Medic";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// Identifier of a rendered icon. Unique for the whole session, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IconId(pub u64);

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "icon-{}", self.0)
    }
}

/// Hands out icon ids in increasing order.
#[derive(Debug, Default)]
pub struct IconAllocator {
    next: u64,
}

impl IconAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> IconId {
        let id = IconId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Echelon band derived from a unit's strength, used to pick icon artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Team,
    Squad,
    Section,
    Platoon,
    Company,
}

impl SizeClass {
    pub fn from_strength(strength: u32) -> Self {
        match strength {
            0..=4 => SizeClass::Team,
            5..=12 => SizeClass::Squad,
            13..=24 => SizeClass::Section,
            25..=44 => SizeClass::Platoon,
            _ => SizeClass::Company,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Team => "team",
            SizeClass::Squad => "squad",
            SizeClass::Section => "section",
            SizeClass::Platoon => "platoon",
            SizeClass::Company => "company",
        }
    }
}

impl std::fmt::Display for SizeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one potential icon: a unit of a given strength at a location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub location: String,
    pub unit: String,
    pub strength: u32,
}

impl Triple {
    pub fn new(location: impl Into<String>, unit: impl Into<String>, strength: u32) -> Self {
        Triple {
            location: location.into(),
            unit: unit.into(),
            strength,
        }
    }

    pub fn size_class(&self) -> SizeClass {
        SizeClass::from_strength(self.strength)
    }
}

/// Catalog entry for a named location, coordinates as fractions of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl LocationSpec {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        LocationSpec {
            name: name.into(),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Medic,
    Unit { name: String, strength: u32 },
}

/// A validated row of the unit sheet: `[unit, strength, location, time]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRow {
    pub kind: RowKind,
    pub location: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    MissingUnit,
    MissingLocation,
    InvalidStrength(String),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::MissingUnit => write!(f, "row has no unit name"),
            RowError::MissingLocation => write!(f, "row has no location"),
            RowError::InvalidStrength(raw) => write!(f, "strength {:?} is not a whole number", raw),
        }
    }
}

impl std::error::Error for RowError {}

fn cell(cells: &[String], idx: usize) -> Option<&str> {
    cells
        .get(idx)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
}

impl UnitRow {
    pub fn parse(cells: &[String]) -> Result<Self, RowError> {
        let unit = cell(cells, 0).ok_or(RowError::MissingUnit)?;
        let location = cell(cells, 2).ok_or(RowError::MissingLocation)?;
        let timestamp = cell(cells, 3).unwrap_or_default().to_string();

        let kind = if unit == MEDIC_UNIT {
            RowKind::Medic
        } else {
            let raw = cell(cells, 1).unwrap_or_default();
            let strength = raw
                .parse::<u32>()
                .map_err(|_| RowError::InvalidStrength(raw.to_string()))?;
            RowKind::Unit {
                name: unit.to_string(),
                strength,
            }
        };

        Ok(UnitRow {
            kind,
            location: location.to_string(),
            timestamp,
        })
    }

    pub fn unit(name: &str, strength: u32, location: &str, timestamp: &str) -> Self {
        UnitRow {
            kind: RowKind::Unit {
                name: name.to_string(),
                strength,
            },
            location: location.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    pub fn medic(location: &str, timestamp: &str) -> Self {
        UnitRow {
            kind: RowKind::Medic,
            location: location.to_string(),
            timestamp: timestamp.to_string(),
        }
    }
}

/// Result of parsing a whole sheet: valid rows in input order plus rejects.
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub rows: Vec<UnitRow>,
    /// Zero-based sheet row index and the reason it was rejected.
    pub rejected: Vec<(usize, RowError)>,
}

pub fn parse_rows(raw: &[Vec<String>]) -> ParsedRows {
    let mut parsed = ParsedRows::default();
    for (idx, cells) in raw.iter().enumerate() {
        match UnitRow::parse(cells) {
            Ok(row) => parsed.rows.push(row),
            Err(e) => {
                tracing::debug!(row = idx, error = %e, "Skipping malformed unit row");
                parsed.rejected.push((idx, e));
            }
        }
    }
    parsed
}

/// One poll of the data provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSnapshot {
    pub units: Vec<Vec<String>>,
    pub notes: Vec<Vec<String>>,
    #[serde(default)]
    pub fetched_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_size_class_breakpoints() {
        assert_eq!(SizeClass::from_strength(0), SizeClass::Team);
        assert_eq!(SizeClass::from_strength(4), SizeClass::Team);
        assert_eq!(SizeClass::from_strength(5), SizeClass::Squad);
        assert_eq!(SizeClass::from_strength(12), SizeClass::Squad);
        assert_eq!(SizeClass::from_strength(13), SizeClass::Section);
        assert_eq!(SizeClass::from_strength(24), SizeClass::Section);
        assert_eq!(SizeClass::from_strength(25), SizeClass::Platoon);
        assert_eq!(SizeClass::from_strength(30), SizeClass::Platoon);
        assert_eq!(SizeClass::from_strength(44), SizeClass::Platoon);
        assert_eq!(SizeClass::from_strength(45), SizeClass::Company);
        assert_eq!(SizeClass::from_strength(200), SizeClass::Company);
    }

    #[test]
    fn test_size_class_serializes_lowercase() {
        let json = serde_json::to_string(&SizeClass::Platoon).unwrap();
        assert_eq!(json, r#""platoon""#);
    }

    #[test]
    fn test_icon_allocator_is_monotonic() {
        let mut ids = IconAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();
        assert!(a < b && b < c);
        assert_eq!(ids.issued(), 3);
    }

    #[test]
    fn test_parse_unit_row() {
        let row = UnitRow::parse(&cells(&["BN", "30", "Anzio", "12:00"])).unwrap();
        assert_eq!(row, UnitRow::unit("BN", 30, "Anzio", "12:00"));
    }

    #[test]
    fn test_parse_trims_cells() {
        let row = UnitRow::parse(&cells(&[" BN ", " 7", "USMA ", "0800"])).unwrap();
        assert_eq!(row, UnitRow::unit("BN", 7, "USMA", "0800"));
    }

    #[test]
    fn test_parse_medic_ignores_strength() {
        let row = UnitRow::parse(&cells(&["Medic", "", "Anzio", "12:00"])).unwrap();
        assert_eq!(row.kind, RowKind::Medic);
        assert_eq!(row.location, "Anzio");
    }

    #[test]
    fn test_parse_missing_fields() {
        assert_eq!(UnitRow::parse(&[]), Err(RowError::MissingUnit));
        assert_eq!(
            UnitRow::parse(&cells(&["BN", "30"])),
            Err(RowError::MissingLocation)
        );
    }

    #[test]
    fn test_parse_missing_timestamp_is_empty() {
        let row = UnitRow::parse(&cells(&["BN", "30", "Anzio"])).unwrap();
        assert_eq!(row.timestamp, "");
    }

    #[test]
    fn test_parse_rejects_non_numeric_strength() {
        assert_eq!(
            UnitRow::parse(&cells(&["BN", "lots", "Anzio", "12:00"])),
            Err(RowError::InvalidStrength("lots".to_string()))
        );
    }

    #[test]
    fn test_parse_rows_keeps_order_and_collects_rejects() {
        let raw = vec![
            cells(&["Unit", "# PAX", "Location", "Time"]),
            cells(&["BN", "30", "Anzio", "12:00"]),
            cells(&["Medic", "1", "Anzio", "12:00"]),
            cells(&[]),
        ];
        let parsed = parse_rows(&raw);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0], UnitRow::unit("BN", 30, "Anzio", "12:00"));
        assert_eq!(parsed.rows[1], UnitRow::medic("Anzio", "12:00"));
        let rejected_rows: Vec<usize> = parsed.rejected.iter().map(|(i, _)| *i).collect();
        assert_eq!(rejected_rows, vec![0, 3]);
    }

    #[test]
    fn test_snapshot_deserializes_without_timestamp() {
        let json = r#"{"units":[["BN","30","USMA","12:00"]],"notes":[["Title"]]}"#;
        let snap: SheetSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.units.len(), 1);
        assert_eq!(snap.notes[0][0], "Title");
        assert!(snap.fetched_at.is_empty());
    }
}
