//! Visually confusable characters.
//!
//! Maps Cyrillic, Greek, small-capital, and fullwidth code points to the
//! Latin letter they imitate. Sourced from the Unicode `confusables.txt`
//! data, restricted to the pairs seen in homoglyph spoofing. Sorted by code
//! point for binary search.

static CONFUSABLES: &[(char, char)] = &[
    ('\u{0131}', 'i'),
    ('\u{0237}', 'j'),
    ('\u{0391}', 'A'),
    ('\u{0392}', 'B'),
    ('\u{0395}', 'E'),
    ('\u{0396}', 'Z'),
    ('\u{0397}', 'H'),
    ('\u{0399}', 'I'),
    ('\u{039A}', 'K'),
    ('\u{039C}', 'M'),
    ('\u{039D}', 'N'),
    ('\u{039F}', 'O'),
    ('\u{03A1}', 'P'),
    ('\u{03A4}', 'T'),
    ('\u{03A5}', 'Y'),
    ('\u{03A7}', 'X'),
    ('\u{03B1}', 'a'),
    ('\u{03BF}', 'o'),
    ('\u{03C1}', 'p'),
    ('\u{0405}', 'S'),
    ('\u{0406}', 'I'),
    ('\u{0408}', 'J'),
    ('\u{0410}', 'A'),
    ('\u{0412}', 'B'),
    ('\u{0415}', 'E'),
    ('\u{041A}', 'K'),
    ('\u{041C}', 'M'),
    ('\u{041D}', 'H'),
    ('\u{041E}', 'O'),
    ('\u{0420}', 'P'),
    ('\u{0421}', 'C'),
    ('\u{0422}', 'T'),
    ('\u{0425}', 'X'),
    ('\u{0430}', 'a'),
    ('\u{0435}', 'e'),
    ('\u{043E}', 'o'),
    ('\u{0440}', 'p'),
    ('\u{0441}', 'c'),
    ('\u{0445}', 'x'),
    ('\u{0455}', 's'),
    ('\u{0456}', 'i'),
    ('\u{0458}', 'j'),
    ('\u{04BB}', 'h'),
    ('\u{04C0}', 'I'),
    ('\u{04CF}', 'l'),
    ('\u{1D00}', 'A'),
    ('\u{1D04}', 'C'),
    ('\u{1D05}', 'D'),
    ('\u{1D07}', 'E'),
    ('\u{1D0A}', 'J'),
    ('\u{1D0B}', 'K'),
    ('\u{1D0D}', 'M'),
    ('\u{1D0F}', 'O'),
    ('\u{1D18}', 'P'),
    ('\u{1D1B}', 'T'),
    ('\u{1D1C}', 'U'),
    ('\u{1D20}', 'V'),
    ('\u{1D21}', 'W'),
    ('\u{1D22}', 'Z'),
    ('\u{FF21}', 'A'),
    ('\u{FF22}', 'B'),
    ('\u{FF23}', 'C'),
    ('\u{FF24}', 'D'),
    ('\u{FF25}', 'E'),
    ('\u{FF26}', 'F'),
    ('\u{FF27}', 'G'),
    ('\u{FF28}', 'H'),
    ('\u{FF29}', 'I'),
    ('\u{FF2A}', 'J'),
    ('\u{FF2B}', 'K'),
    ('\u{FF2C}', 'L'),
    ('\u{FF2D}', 'M'),
    ('\u{FF2E}', 'N'),
    ('\u{FF2F}', 'O'),
    ('\u{FF30}', 'P'),
    ('\u{FF31}', 'Q'),
    ('\u{FF32}', 'R'),
    ('\u{FF33}', 'S'),
    ('\u{FF34}', 'T'),
    ('\u{FF35}', 'U'),
    ('\u{FF36}', 'V'),
    ('\u{FF37}', 'W'),
    ('\u{FF38}', 'X'),
    ('\u{FF39}', 'Y'),
    ('\u{FF3A}', 'Z'),
    ('\u{FF41}', 'a'),
    ('\u{FF42}', 'b'),
    ('\u{FF43}', 'c'),
    ('\u{FF44}', 'd'),
    ('\u{FF45}', 'e'),
    ('\u{FF46}', 'f'),
    ('\u{FF47}', 'g'),
    ('\u{FF48}', 'h'),
    ('\u{FF49}', 'i'),
    ('\u{FF4A}', 'j'),
    ('\u{FF4B}', 'k'),
    ('\u{FF4C}', 'l'),
    ('\u{FF4D}', 'm'),
    ('\u{FF4E}', 'n'),
    ('\u{FF4F}', 'o'),
    ('\u{FF50}', 'p'),
    ('\u{FF51}', 'q'),
    ('\u{FF52}', 'r'),
    ('\u{FF53}', 's'),
    ('\u{FF54}', 't'),
    ('\u{FF55}', 'u'),
    ('\u{FF56}', 'v'),
    ('\u{FF57}', 'w'),
    ('\u{FF58}', 'x'),
    ('\u{FF59}', 'y'),
    ('\u{FF5A}', 'z'),
];

/// Returns the Latin letter `c` imitates, if it is a known confusable.
pub fn latin_lookalike(c: char) -> Option<char> {
    CONFUSABLES
        .binary_search_by_key(&c, |&(k, _)| k)
        .ok()
        .map(|i| CONFUSABLES[i].1)
}

pub fn is_confusable(c: char) -> bool {
    latin_lookalike(c).is_some()
}
