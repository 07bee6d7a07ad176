//! Natural isotope abundances and exact masses (NIST).
//!
//! Only isotopes above [`ABUNDANCE_THRESHOLD`] take part in enumeration, and
//! tin and osmium are further restricted to their two most abundant isotopes
//! to bound branching.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Isotopes at or below this natural abundance are ignored.
pub const ABUNDANCE_THRESHOLD: f64 = 0.005;

/// Elements whose isotope list is truncated to the top two.
const TOP_TWO_ONLY: [&str; 2] = ["Sn", "Os"];

/// One naturally occurring isotope.
#[derive(Debug, Clone, PartialEq)]
pub struct Isotope {
    /// Mass number (e.g. 13 for carbon-13)
    pub mass_number: u16,
    /// Relative atomic mass in Da
    pub mass: f64,
    /// Natural abundance as a fraction
    pub abundance: f64,
}

/// The isotopes of one element that take part in enumeration, ordered by
/// descending abundance.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementIsotopes {
    /// Element symbol
    pub symbol: &'static str,
    /// Retained isotopes, most abundant first
    pub isotopes: Vec<Isotope>,
}

impl ElementIsotopes {
    /// Mass of the most abundant isotope.
    pub fn reference_mass(&self) -> f64 {
        self.isotopes[0].mass
    }

    /// Human-readable isotope labels such as `C13`.
    pub fn labels(&self) -> Vec<String> {
        self.isotopes
            .iter()
            .map(|iso| format!("{}{}", self.symbol, iso.mass_number))
            .collect()
    }

    /// Multinomial probability vector. The last slot absorbs the remainder so
    /// the vector sums to one after low-abundance isotopes were dropped.
    pub fn probability_vector(&self) -> Vec<f64> {
        let mut probs: Vec<f64> = self.isotopes.iter().map(|iso| iso.abundance).collect();
        if let Some((last, head)) = probs.split_last_mut() {
            let head_sum: f64 = head.iter().sum();
            *last = (1.0 - head_sum).max(0.0);
        }
        probs
    }

    /// Exact isotope masses aligned with [`Self::probability_vector`].
    pub fn mass_vector(&self) -> Vec<f64> {
        self.isotopes.iter().map(|iso| iso.mass).collect()
    }
}

// (symbol, [(mass number, relative atomic mass, abundance)])
type RawElement = (&'static str, &'static [(u16, f64, f64)]);

const RAW_TABLE: &[RawElement] = &[
    ("H", &[(1, 1.00782503223, 0.999885), (2, 2.01410177812, 0.000115)]),
    ("Li", &[(6, 6.0151228874, 0.0759), (7, 7.0160034366, 0.9241)]),
    ("B", &[(10, 10.01293695, 0.199), (11, 11.00930536, 0.801)]),
    ("C", &[(12, 12.0, 0.9893), (13, 13.00335483507, 0.0107)]),
    ("N", &[(14, 14.00307400443, 0.99636), (15, 15.00010889888, 0.00364)]),
    (
        "O",
        &[
            (16, 15.99491461957, 0.99757),
            (17, 16.99913175650, 0.00038),
            (18, 17.99915961286, 0.00205),
        ],
    ),
    ("F", &[(19, 18.99840316273, 1.0)]),
    ("Na", &[(23, 22.9897692820, 1.0)]),
    (
        "Mg",
        &[
            (24, 23.985041697, 0.7899),
            (25, 24.985836976, 0.1000),
            (26, 25.982592968, 0.1101),
        ],
    ),
    ("Al", &[(27, 26.98153853, 1.0)]),
    (
        "Si",
        &[
            (28, 27.97692653465, 0.92223),
            (29, 28.97649466490, 0.04685),
            (30, 29.973770136, 0.03092),
        ],
    ),
    ("P", &[(31, 30.97376199842, 1.0)]),
    (
        "S",
        &[
            (32, 31.9720711744, 0.9499),
            (33, 32.9714589098, 0.0075),
            (34, 33.967867004, 0.0425),
            (36, 35.96708071, 0.0001),
        ],
    ),
    ("Cl", &[(35, 34.968852682, 0.7576), (37, 36.965902602, 0.2424)]),
    (
        "K",
        &[
            (39, 38.9637064864, 0.932581),
            (40, 39.963998166, 0.000117),
            (41, 40.9618252579, 0.067302),
        ],
    ),
    (
        "Ca",
        &[
            (40, 39.962590863, 0.96941),
            (42, 41.95861783, 0.00647),
            (43, 42.95876644, 0.00135),
            (44, 43.95548156, 0.02086),
            (46, 45.9536890, 0.00004),
            (48, 47.95252276, 0.00187),
        ],
    ),
    (
        "Cr",
        &[
            (50, 49.94604183, 0.04345),
            (52, 51.94050623, 0.83789),
            (53, 52.94064815, 0.09501),
            (54, 53.93887916, 0.02365),
        ],
    ),
    ("Mn", &[(55, 54.93804391, 1.0)]),
    (
        "Fe",
        &[
            (54, 53.93960899, 0.05845),
            (56, 55.93493633, 0.91754),
            (57, 56.93539284, 0.02119),
            (58, 57.93327443, 0.00282),
        ],
    ),
    ("Co", &[(59, 58.93319429, 1.0)]),
    (
        "Ni",
        &[
            (58, 57.93534241, 0.68077),
            (60, 59.93078588, 0.26223),
            (61, 60.93105557, 0.011399),
            (62, 61.92834537, 0.036346),
            (64, 63.92796682, 0.009255),
        ],
    ),
    ("Cu", &[(63, 62.92959772, 0.6915), (65, 64.92778970, 0.3085)]),
    (
        "Zn",
        &[
            (64, 63.92914201, 0.4917),
            (66, 65.92603381, 0.2773),
            (67, 66.92712775, 0.0404),
            (68, 67.92484455, 0.1845),
            (70, 69.9253192, 0.0061),
        ],
    ),
    ("As", &[(75, 74.92159457, 1.0)]),
    (
        "Se",
        &[
            (74, 73.922475934, 0.0089),
            (76, 75.919213704, 0.0937),
            (77, 76.919914154, 0.0763),
            (78, 77.91730928, 0.2377),
            (80, 79.9165218, 0.4961),
            (82, 81.9166995, 0.0873),
        ],
    ),
    ("Br", &[(79, 78.9183376, 0.5069), (81, 80.9162897, 0.4931)]),
    ("Ag", &[(107, 106.9050916, 0.51839), (109, 108.9047553, 0.48161)]),
    (
        "Sn",
        &[
            (112, 111.90482387, 0.0097),
            (114, 113.9027827, 0.0066),
            (115, 114.903344699, 0.0034),
            (116, 115.90174280, 0.1454),
            (117, 116.90295398, 0.0768),
            (118, 117.90160657, 0.2422),
            (119, 118.90331117, 0.0859),
            (120, 119.90220163, 0.3258),
            (122, 121.9034438, 0.0463),
            (124, 123.9052766, 0.0579),
        ],
    ),
    ("Sb", &[(121, 120.9038120, 0.5721), (123, 122.9042132, 0.4279)]),
    ("I", &[(127, 126.9044719, 1.0)]),
    (
        "Os",
        &[
            (184, 183.9524885, 0.0002),
            (186, 185.9538350, 0.0159),
            (187, 186.9557474, 0.0196),
            (188, 187.9558352, 0.1324),
            (189, 188.9581442, 0.1615),
            (190, 189.9584437, 0.2626),
            (192, 191.9614770, 0.4078),
        ],
    ),
    (
        "Pt",
        &[
            (190, 189.9599297, 0.00012),
            (192, 191.9610387, 0.00782),
            (194, 193.9626809, 0.3286),
            (195, 194.9647917, 0.3378),
            (196, 195.96495209, 0.2521),
            (198, 197.9678949, 0.07356),
        ],
    ),
    ("Au", &[(197, 196.96656879, 1.0)]),
    (
        "Hg",
        &[
            (196, 195.9658326, 0.0015),
            (198, 197.96676860, 0.0997),
            (199, 198.96828064, 0.1687),
            (200, 199.96832659, 0.2310),
            (201, 200.97030284, 0.1318),
            (202, 201.97064340, 0.2986),
            (204, 203.97349398, 0.0687),
        ],
    ),
    (
        "Pb",
        &[
            (204, 203.9730440, 0.014),
            (206, 205.9744657, 0.241),
            (207, 206.9758973, 0.221),
            (208, 207.9766525, 0.524),
        ],
    ),
    ("Bi", &[(209, 208.9803991, 1.0)]),
];

fn build_table() -> HashMap<&'static str, ElementIsotopes> {
    RAW_TABLE
        .iter()
        .filter_map(|&(symbol, raw)| {
            let mut isotopes: Vec<Isotope> = raw
                .iter()
                .filter(|(_, _, abundance)| *abundance > ABUNDANCE_THRESHOLD)
                .map(|&(mass_number, mass, abundance)| Isotope {
                    mass_number,
                    mass,
                    abundance,
                })
                .collect();
            isotopes.sort_by(|a, b| b.abundance.total_cmp(&a.abundance));
            if TOP_TWO_ONLY.contains(&symbol) {
                isotopes.truncate(2);
            }
            if isotopes.is_empty() {
                None
            } else {
                Some((symbol, ElementIsotopes { symbol, isotopes }))
            }
        })
        .collect()
}

/// Look up the retained isotopes of an element.
pub fn element(symbol: &str) -> Option<&'static ElementIsotopes> {
    static TABLE: OnceLock<HashMap<&'static str, ElementIsotopes>> = OnceLock::new();
    TABLE.get_or_init(build_table).get(symbol)
}
