// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Column descriptors shared by every table format.
//!
//! A [`Field`] is created when a column is declared (VOTable `FIELD`, FITS
//! `TTYPEn`, or a CSV header cell). Fields are indexed in declaration order
//! and that index is what the role classifier and the resolver refer to.

use serde::Serialize;

/// Sentinel written into cells missing from a short row.
pub const MISSING_CELL: &str = "???";

/// A decoded table row: one string cell per declared field.
pub type Record = Vec<String>;

/// Primitive datatype of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Logical,
    Bit,
    UnsignedByte,
    Short,
    Int,
    Long,
    Char,
    UnicodeChar,
    Float,
    Double,
    FloatComplex,
    DoubleComplex,
}

impl DataType {
    /// Parse a VOTable `datatype` attribute value.
    pub fn from_votable(name: &str) -> Option<Self> {
        let dt = match name.trim() {
            "boolean" => DataType::Logical,
            "bit" => DataType::Bit,
            "unsignedByte" => DataType::UnsignedByte,
            "short" => DataType::Short,
            "int" => DataType::Int,
            "long" => DataType::Long,
            "char" => DataType::Char,
            "unicodeChar" => DataType::UnicodeChar,
            "float" => DataType::Float,
            "double" => DataType::Double,
            "floatComplex" => DataType::FloatComplex,
            "doubleComplex" => DataType::DoubleComplex,
            _ => return None,
        };
        Some(dt)
    }

    /// VOTable name of this datatype.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Logical => "boolean",
            DataType::Bit => "bit",
            DataType::UnsignedByte => "unsignedByte",
            DataType::Short => "short",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Char => "char",
            DataType::UnicodeChar => "unicodeChar",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::FloatComplex => "floatComplex",
            DataType::DoubleComplex => "doubleComplex",
        }
    }

    /// Whether values of this type are numeric.
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            DataType::Logical | DataType::Bit | DataType::Char | DataType::UnicodeChar
        )
    }
}

/// Declared element count of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum ArraySize {
    /// A single value.
    #[default]
    Scalar,
    /// Exactly `n` elements.
    Fixed(usize),
    /// Variable length, optionally bounded.
    Variable { max: Option<usize> },
}

impl ArraySize {
    /// Parse a VOTable `arraysize` attribute (`"8"`, `"*"`, `"10*"`, `"3x4"`, `"2x*"`).
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return ArraySize::Scalar;
        }
        let mut product = 1usize;
        let mut variable = false;
        let mut bound = None;
        for dim in text.split('x') {
            let dim = dim.trim();
            if let Some(prefix) = dim.strip_suffix('*') {
                variable = true;
                bound = prefix.parse::<usize>().ok();
                continue;
            }
            match dim.parse::<usize>() {
                Ok(n) => product = product.saturating_mul(n),
                Err(_) => variable = true,
            }
        }
        if variable {
            ArraySize::Variable {
                max: bound.map(|b| b.saturating_mul(product)),
            }
        } else {
            ArraySize::Fixed(product)
        }
    }

    /// Fixed element count, `None` for variable length.
    pub fn fixed_count(&self) -> Option<usize> {
        match self {
            ArraySize::Scalar => Some(1),
            ArraySize::Fixed(n) => Some(*n),
            ArraySize::Variable { .. } => None,
        }
    }

    /// Whether the column holds more than one element (or may).
    pub fn is_array(&self) -> bool {
        !matches!(self, ArraySize::Scalar)
    }
}

/// Semantic role a column can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Ra,
    Dec,
    PmRa,
    PmDec,
    X,
    Y,
    Time,
}

impl Role {
    /// All roles, in classification order.
    pub const ALL: [Role; 7] = [
        Role::Ra,
        Role::Dec,
        Role::PmRa,
        Role::PmDec,
        Role::X,
        Role::Y,
        Role::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Ra => "RA",
            Role::Dec => "DEC",
            Role::PmRa => "PMRA",
            Role::PmDec => "PMDEC",
            Role::X => "X",
            Role::Y => "Y",
            Role::Time => "TIME",
        }
    }
}

/// Column descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Field {
    /// Column name
    pub name: String,
    /// XML `ID` attribute
    pub id: Option<String>,
    /// Unified Content Descriptor
    pub ucd: Option<String>,
    /// Data model `utype`
    pub utype: Option<String>,
    /// Unit string as declared
    pub unit: Option<String>,
    /// Primitive datatype, if declared
    pub datatype: Option<DataType>,
    /// Element count
    pub array_size: ArraySize,
    /// Display width
    pub width: Option<usize>,
    /// Display precision as declared (VOTable `precision` or FITS `TDISPn`)
    pub precision: Option<String>,
    /// Reference to a COOSYS/TIMESYS/STC system by ID
    pub reference: Option<String>,
    /// Free text description
    pub description: Option<String>,
    /// Null sentinel (VOTable `VALUES null`, FITS `TNULLn`)
    pub null_value: Option<String>,
    /// Role assigned by the classifier
    pub role: Option<Role>,
}

impl Field {
    /// Create a new field with a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the UCD.
    pub fn with_ucd(mut self, ucd: impl Into<String>) -> Self {
        self.ucd = Some(ucd.into());
        self
    }

    /// Set the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the datatype.
    pub fn with_datatype(mut self, datatype: DataType) -> Self {
        self.datatype = Some(datatype);
        self
    }

    /// Set the array size.
    pub fn with_array_size(mut self, array_size: ArraySize) -> Self {
        self.array_size = array_size;
        self
    }

    /// Set the coordinate/time system reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Set the ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the null sentinel.
    pub fn with_null_value(mut self, null: impl Into<String>) -> Self {
        self.null_value = Some(null.into());
        self
    }

    /// Lower-cased UCD, or empty.
    pub fn ucd_lower(&self) -> String {
        self.ucd.as_deref().unwrap_or("").trim().to_ascii_lowercase()
    }

    /// Lower-cased unit, or empty.
    pub fn unit_lower(&self) -> String {
        self.unit.as_deref().unwrap_or("").trim().to_ascii_lowercase()
    }
}
