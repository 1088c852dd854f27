use super::document::Collection;

/// A named counter producing human-readable codes such as `N008`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequence {
    pub key: &'static str,
    pub collection: Collection,
    /// Numeric field holding the allocated value; seeds a fresh counter.
    pub field: &'static str,
    pub prefix: &'static str,
    pub width: usize,
}

impl Sequence {
    pub const LAMINATE_NUMBER: Sequence = Sequence {
        key: "laminate_number",
        collection: Collection::LaminateNumbers,
        field: "postfix",
        prefix: "N",
        width: 3,
    };

    pub const VENEER_SIZE: Sequence = Sequence {
        key: "veneer_size",
        collection: Collection::VeneerSizes,
        field: "postfix",
        prefix: "V",
        width: 3,
    };

    pub fn format(&self, value: i64) -> String {
        format!("{}{:0width$}", self.prefix, value, width = self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_padded_codes() {
        assert_eq!(Sequence::LAMINATE_NUMBER.format(8), "N008");
        assert_eq!(Sequence::LAMINATE_NUMBER.format(10), "N010");
        assert_eq!(Sequence::VENEER_SIZE.format(123), "V123");
        assert_eq!(Sequence::VENEER_SIZE.format(4567), "V4567");
    }
}
