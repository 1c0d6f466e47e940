// ISO 639-3 codes retired through a merge, paired with the code they were merged into.
// Splits have no single successor and are left out.
const RETIRED_CODES: &[(&str, &str)] = &[
    ("ajt", "aeb"),
    ("aue", "ktz"),
    ("cmk", "xch"),
    ("drw", "prs"),
    ("gav", "dev"),
    ("gfx", "vaj"),
    ("gti", "nyc"),
    ("ibi", "opa"),
    ("jeg", "oyb"),
    ("kgc", "tdf"),
    ("kgh", "kml"),
    ("koj", "kwv"),
    ("ktr", "dtp"),
    ("kzj", "dtp"),
    ("kzt", "dtp"),
    ("lmm", "rmx"),
    ("meg", "cir"),
    ("mol", "ron"),
    ("mst", "mry"),
    ("mwj", "vaj"),
    ("myt", "mry"),
    ("oun", "vaj"),
    ("pcr", "adx"),
    ("ppa", "bfy"),
    ("ppr", "lcq"),
    ("pry", "prt"),
    ("puz", "pub"),
    ("sca", "hle"),
    ("skk", "oyb"),
    ("tdu", "dtp"),
    ("thx", "oyb"),
    ("tmp", "tyj"),
    ("tnf", "prs"),
    ("xia", "acn"),
    ("ybd", "rki"),
    ("ymt", "mtm"),
    ("yos", "zom"),
];

/// Successor of a retired 3-letter code, if the code was retired by a merge.
pub(super) fn replacement(code: &str) -> Option<&'static str> {
    RETIRED_CODES
        .binary_search_by(|(retired, _)| (*retired).cmp(code))
        .ok()
        .map(|index| RETIRED_CODES[index].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_for_binary_search() {
        assert!(RETIRED_CODES.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn test_replacement_lookup() {
        assert_eq!(replacement("mol"), Some("ron"));
        assert_eq!(replacement("kzj"), Some("dtp"));
        assert_eq!(replacement("eng"), None);
    }
}
