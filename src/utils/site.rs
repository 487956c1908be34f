use crate::utils::Result;

/// A single reference position on a named contig.
///
/// Positions are 0-based internally. `from_string` accepts the 1-based
/// `contig:position` encoding used on the command line and converts.
#[derive(Debug, PartialEq, Clone)]
pub struct GenomicSite {
    pub contig: String,
    pub position: i64,
}

impl GenomicSite {
    pub fn new(contig: impl Into<String>, position: i64) -> Result<Self> {
        if position < 0 {
            return Err(format!("Invalid site: negative position {}", position));
        }

        Ok(Self {
            contig: contig.into(),
            position,
        })
    }

    pub fn from_string(encoding: &str) -> Result<Self> {
        let error_msg = || format!("Invalid site encoding: {}", encoding);
        let elements: Vec<&str> = encoding.split(':').collect();

        if elements.len() != 2 || elements[0].is_empty() {
            return Err(error_msg());
        }

        let position: i64 = elements[1].parse().map_err(|_| error_msg())?;
        if position < 1 {
            return Err(error_msg());
        }

        Self::new(elements[0].to_string(), position - 1)
    }

    pub fn label(&self) -> String {
        format!("{}:{}", self.contig, self.position + 1)
    }
}

impl std::fmt::Display for GenomicSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::GenomicSite;

    #[test]
    fn init_site_from_valid_string_ok() {
        let site = GenomicSite::from_string("chr1:12345").unwrap();
        assert_eq!(site.contig, "chr1");
        assert_eq!(site.position, 12344);
        assert_eq!(site.label(), "chr1:12345");
    }

    #[test]
    fn init_site_from_extra_colon_err() {
        assert_eq!(
            GenomicSite::from_string("chr:1:12345"),
            Err("Invalid site encoding: chr:1:12345".to_string())
        );
    }

    #[test]
    fn init_site_from_invalid_position_err() {
        assert_eq!(
            GenomicSite::from_string("chr1:abc"),
            Err("Invalid site encoding: chr1:abc".to_string())
        );
        assert_eq!(
            GenomicSite::from_string("chr1:0"),
            Err("Invalid site encoding: chr1:0".to_string())
        );
    }

    #[test]
    fn init_site_from_negative_position_err() {
        assert_eq!(
            GenomicSite::new("chr1", -5),
            Err("Invalid site: negative position -5".to_string())
        );
    }
}
