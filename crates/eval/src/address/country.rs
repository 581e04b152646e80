//! Country name to ISO 3166-1 alpha-2 resolution.

/// Every ISO 3166-1 entry: alpha-2 code and short English name.
const COUNTRIES: &[(&str, &str)] = &[
    ("AD", "andorra"),
    ("AE", "united arab emirates"),
    ("AF", "afghanistan"),
    ("AG", "antigua and barbuda"),
    ("AI", "anguilla"),
    ("AL", "albania"),
    ("AM", "armenia"),
    ("AO", "angola"),
    ("AQ", "antarctica"),
    ("AR", "argentina"),
    ("AS", "american samoa"),
    ("AT", "austria"),
    ("AU", "australia"),
    ("AW", "aruba"),
    ("AX", "aland islands"),
    ("AZ", "azerbaijan"),
    ("BA", "bosnia and herzegovina"),
    ("BB", "barbados"),
    ("BD", "bangladesh"),
    ("BE", "belgium"),
    ("BF", "burkina faso"),
    ("BG", "bulgaria"),
    ("BH", "bahrain"),
    ("BI", "burundi"),
    ("BJ", "benin"),
    ("BL", "saint barthelemy"),
    ("BM", "bermuda"),
    ("BN", "brunei darussalam"),
    ("BO", "bolivia"),
    ("BQ", "bonaire, sint eustatius and saba"),
    ("BR", "brazil"),
    ("BS", "bahamas"),
    ("BT", "bhutan"),
    ("BV", "bouvet island"),
    ("BW", "botswana"),
    ("BY", "belarus"),
    ("BZ", "belize"),
    ("CA", "canada"),
    ("CC", "cocos (keeling) islands"),
    ("CD", "congo, democratic republic of the"),
    ("CF", "central african republic"),
    ("CG", "congo"),
    ("CH", "switzerland"),
    ("CI", "cote d'ivoire"),
    ("CK", "cook islands"),
    ("CL", "chile"),
    ("CM", "cameroon"),
    ("CN", "china"),
    ("CO", "colombia"),
    ("CR", "costa rica"),
    ("CU", "cuba"),
    ("CV", "cabo verde"),
    ("CW", "curacao"),
    ("CX", "christmas island"),
    ("CY", "cyprus"),
    ("CZ", "czechia"),
    ("DE", "germany"),
    ("DJ", "djibouti"),
    ("DK", "denmark"),
    ("DM", "dominica"),
    ("DO", "dominican republic"),
    ("DZ", "algeria"),
    ("EC", "ecuador"),
    ("EE", "estonia"),
    ("EG", "egypt"),
    ("EH", "western sahara"),
    ("ER", "eritrea"),
    ("ES", "spain"),
    ("ET", "ethiopia"),
    ("FI", "finland"),
    ("FJ", "fiji"),
    ("FK", "falkland islands (malvinas)"),
    ("FM", "micronesia"),
    ("FO", "faroe islands"),
    ("FR", "france"),
    ("GA", "gabon"),
    ("GB", "united kingdom"),
    ("GD", "grenada"),
    ("GE", "georgia"),
    ("GF", "french guiana"),
    ("GG", "guernsey"),
    ("GH", "ghana"),
    ("GI", "gibraltar"),
    ("GL", "greenland"),
    ("GM", "gambia"),
    ("GN", "guinea"),
    ("GP", "guadeloupe"),
    ("GQ", "equatorial guinea"),
    ("GR", "greece"),
    ("GS", "south georgia and the south sandwich islands"),
    ("GT", "guatemala"),
    ("GU", "guam"),
    ("GW", "guinea-bissau"),
    ("GY", "guyana"),
    ("HK", "hong kong"),
    ("HM", "heard island and mcdonald islands"),
    ("HN", "honduras"),
    ("HR", "croatia"),
    ("HT", "haiti"),
    ("HU", "hungary"),
    ("ID", "indonesia"),
    ("IE", "ireland"),
    ("IL", "israel"),
    ("IM", "isle of man"),
    ("IN", "india"),
    ("IO", "british indian ocean territory"),
    ("IQ", "iraq"),
    ("IR", "iran"),
    ("IS", "iceland"),
    ("IT", "italy"),
    ("JE", "jersey"),
    ("JM", "jamaica"),
    ("JO", "jordan"),
    ("JP", "japan"),
    ("KE", "kenya"),
    ("KG", "kyrgyzstan"),
    ("KH", "cambodia"),
    ("KI", "kiribati"),
    ("KM", "comoros"),
    ("KN", "saint kitts and nevis"),
    ("KP", "north korea"),
    ("KR", "south korea"),
    ("KW", "kuwait"),
    ("KY", "cayman islands"),
    ("KZ", "kazakhstan"),
    ("LA", "lao people's democratic republic"),
    ("LB", "lebanon"),
    ("LC", "saint lucia"),
    ("LI", "liechtenstein"),
    ("LK", "sri lanka"),
    ("LR", "liberia"),
    ("LS", "lesotho"),
    ("LT", "lithuania"),
    ("LU", "luxembourg"),
    ("LV", "latvia"),
    ("LY", "libya"),
    ("MA", "morocco"),
    ("MC", "monaco"),
    ("MD", "moldova"),
    ("ME", "montenegro"),
    ("MF", "saint martin (french part)"),
    ("MG", "madagascar"),
    ("MH", "marshall islands"),
    ("MK", "north macedonia"),
    ("ML", "mali"),
    ("MM", "myanmar"),
    ("MN", "mongolia"),
    ("MO", "macao"),
    ("MP", "northern mariana islands"),
    ("MQ", "martinique"),
    ("MR", "mauritania"),
    ("MS", "montserrat"),
    ("MT", "malta"),
    ("MU", "mauritius"),
    ("MV", "maldives"),
    ("MW", "malawi"),
    ("MX", "mexico"),
    ("MY", "malaysia"),
    ("MZ", "mozambique"),
    ("NA", "namibia"),
    ("NC", "new caledonia"),
    ("NE", "niger"),
    ("NF", "norfolk island"),
    ("NG", "nigeria"),
    ("NI", "nicaragua"),
    ("NL", "netherlands"),
    ("NO", "norway"),
    ("NP", "nepal"),
    ("NR", "nauru"),
    ("NU", "niue"),
    ("NZ", "new zealand"),
    ("OM", "oman"),
    ("PA", "panama"),
    ("PE", "peru"),
    ("PF", "french polynesia"),
    ("PG", "papua new guinea"),
    ("PH", "philippines"),
    ("PK", "pakistan"),
    ("PL", "poland"),
    ("PM", "saint pierre and miquelon"),
    ("PN", "pitcairn"),
    ("PR", "puerto rico"),
    ("PS", "palestine"),
    ("PT", "portugal"),
    ("PW", "palau"),
    ("PY", "paraguay"),
    ("QA", "qatar"),
    ("RE", "reunion"),
    ("RO", "romania"),
    ("RS", "serbia"),
    ("RU", "russian federation"),
    ("RW", "rwanda"),
    ("SA", "saudi arabia"),
    ("SB", "solomon islands"),
    ("SC", "seychelles"),
    ("SD", "sudan"),
    ("SE", "sweden"),
    ("SG", "singapore"),
    ("SH", "saint helena, ascension and tristan da cunha"),
    ("SI", "slovenia"),
    ("SJ", "svalbard and jan mayen"),
    ("SK", "slovakia"),
    ("SL", "sierra leone"),
    ("SM", "san marino"),
    ("SN", "senegal"),
    ("SO", "somalia"),
    ("SR", "suriname"),
    ("SS", "south sudan"),
    ("ST", "sao tome and principe"),
    ("SV", "el salvador"),
    ("SX", "sint maarten (dutch part)"),
    ("SY", "syrian arab republic"),
    ("SZ", "eswatini"),
    ("TC", "turks and caicos islands"),
    ("TD", "chad"),
    ("TF", "french southern territories"),
    ("TG", "togo"),
    ("TH", "thailand"),
    ("TJ", "tajikistan"),
    ("TK", "tokelau"),
    ("TL", "timor-leste"),
    ("TM", "turkmenistan"),
    ("TN", "tunisia"),
    ("TO", "tonga"),
    ("TR", "turkiye"),
    ("TT", "trinidad and tobago"),
    ("TV", "tuvalu"),
    ("TW", "taiwan"),
    ("TZ", "tanzania"),
    ("UA", "ukraine"),
    ("UG", "uganda"),
    ("UM", "united states minor outlying islands"),
    ("US", "united states"),
    ("UY", "uruguay"),
    ("UZ", "uzbekistan"),
    ("VA", "holy see"),
    ("VC", "saint vincent and the grenadines"),
    ("VE", "venezuela"),
    ("VG", "virgin islands (british)"),
    ("VI", "virgin islands (u.s.)"),
    ("VN", "viet nam"),
    ("VU", "vanuatu"),
    ("WF", "wallis and futuna"),
    ("WS", "samoa"),
    ("YE", "yemen"),
    ("YT", "mayotte"),
    ("ZA", "south africa"),
    ("ZM", "zambia"),
    ("ZW", "zimbabwe"),
];

/// Other names in common use.
const ALIASES: &[(&str, &str)] = &[
    ("usa", "US"),
    ("united states of america", "US"),
    ("america", "US"),
    ("uk", "GB"),
    ("great britain", "GB"),
    ("britain", "GB"),
    ("england", "GB"),
    ("scotland", "GB"),
    ("wales", "GB"),
    ("northern ireland", "GB"),
    ("uae", "AE"),
    ("russia", "RU"),
    ("vietnam", "VN"),
    ("laos", "LA"),
    ("syria", "SY"),
    ("turkey", "TR"),
    ("czech republic", "CZ"),
    ("ivory coast", "CI"),
    ("cape verde", "CV"),
    ("swaziland", "SZ"),
    ("macedonia", "MK"),
    ("burma", "MM"),
    ("east timor", "TL"),
    ("vatican", "VA"),
    ("vatican city", "VA"),
    ("brunei", "BN"),
    ("korea", "KR"),
    ("republic of korea", "KR"),
    ("dprk", "KP"),
    ("drc", "CD"),
    ("democratic republic of the congo", "CD"),
    ("republic of the congo", "CG"),
    ("falkland islands", "FK"),
    ("macau", "MO"),
    ("the netherlands", "NL"),
    ("holland", "NL"),
    ("the gambia", "GM"),
    ("the bahamas", "BS"),
    ("micronesia, federated states of", "FM"),
    ("moldova, republic of", "MD"),
    ("tanzania, united republic of", "TZ"),
    ("iran, islamic republic of", "IR"),
    ("bolivia, plurinational state of", "BO"),
    ("venezuela, bolivarian republic of", "VE"),
    ("palestine, state of", "PS"),
];

/// Fold accents and spacing so "Côte d’Ivoire" and "cote d'ivoire" meet.
fn normalise(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        let folded = match ch {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            '’' | '‘' => '\'',
            c if c.is_whitespace() => ' ',
            c => c,
        };
        if folded == ' ' && out.ends_with(' ') {
            continue;
        }
        out.push(folded);
    }
    out
}

/// Resolve a country name (or an already-resolved two-letter code) to
/// its ISO alpha-2 code. Matching ignores case, accents and surrounding
/// spaces.
pub fn iso2(country: &str) -> Option<&'static str> {
    let needle = normalise(country);
    if needle.is_empty() {
        return None;
    }
    let by_name = COUNTRIES
        .iter()
        .find(|(_, name)| *name == needle)
        .map(|(code, _)| *code);
    by_name
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == needle)
                .map(|(_, code)| *code)
        })
        .or_else(|| {
            COUNTRIES
                .iter()
                .find(|(code, _)| code.eq_ignore_ascii_case(&needle))
                .map(|(code, _)| *code)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_and_codes() {
        assert_eq!(iso2("India"), Some("IN"));
        assert_eq!(iso2("  united states of america "), Some("US"));
        assert_eq!(iso2("gb"), Some("GB"));
        assert_eq!(iso2("UK"), Some("GB"));
    }

    #[test]
    fn resolves_any_iso_country() {
        assert_eq!(iso2("Brazil"), Some("BR"));
        assert_eq!(iso2("Pakistan"), Some("PK"));
        assert_eq!(iso2("Indonesia"), Some("ID"));
        assert_eq!(iso2("Mexico"), Some("MX"));
        assert_eq!(iso2("Côte d’Ivoire"), Some("CI"));
        assert_eq!(iso2("Bosnia  and Herzegovina"), Some("BA"));
        assert_eq!(iso2("Vietnam"), Some("VN"));
        assert_eq!(iso2("zw"), Some("ZW"));
    }

    #[test]
    fn table_is_complete_and_unique() {
        assert_eq!(COUNTRIES.len(), 249);
        let mut codes: Vec<&str> = COUNTRIES.iter().map(|(c, _)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), COUNTRIES.len());
        for (_, code) in ALIASES {
            assert!(codes.contains(code), "alias code {code} not in table");
        }
    }

    #[test]
    fn unknown_or_blank_is_none() {
        assert_eq!(iso2("Atlantis"), None);
        assert_eq!(iso2(""), None);
        assert_eq!(iso2("ZZ"), None);
    }
}
