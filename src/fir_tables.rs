//! Fixed FIR coefficient banks used by the pulse shaper (C2), one per
//! supported oversampling factor. Transcribed verbatim, tap for tap, from
//! the reference filter design — including tap 42 (0-indexed) of the
//! 91-tap bank, `.219781559828021e-01`, which breaks the bank's otherwise
//! near-linear-phase symmetry. Spec §4.2 calls for using the same banks
//! "with the coefficients given in the source"; that tap is kept exactly
//! as given rather than silently "corrected" to match its neighbors.

pub const NOVS_8: [f32; 91] = [
    7.298941506695379e-04,
    1.012674740974449e-04,
    -6.400057619412672e-04,
    -1.317153962281510e-03,
    -1.746403846176797e-03,
    -1.779735081575717e-03,
    -1.344436388157660e-03,
    -4.702061727525083e-04,
    7.036942342949051e-04,
    1.945162523354514e-03,
    2.969009330533594e-03,
    3.493821608581103e-03,
    3.305667395036481e-03,
    2.315743647984128e-03,
    5.988670154180114e-04,
    -1.597789006581647e-03,
    -3.881349490139374e-03,
    -5.774285130329619e-03,
    -6.801706426747524e-03,
    -6.590495820966173e-03,
    -4.961811109567827e-03,
    -1.997650857781989e-03,
    1.934989864517913e-03,
    6.212536166683968e-03,
    1.003709785712439e-02,
    1.256384744877031e-02,
    1.305542734154087e-02,
    1.103840652031024e-02,
    6.433838249830143e-03,
    -3.642180039147574e-04,
    -8.481715163876228e-03,
    -1.663806141580324e-02,
    -2.329586276880056e-02,
    -2.686956962230974e-02,
    -2.596439149278374e-02,
    -1.960969633644766e-02,
    -7.449508483547277e-03,
    1.014277661163307e-02,
    3.204819670450183e-02,
    5.649294303335348e-02,
    8.123807589704976e-02,
    1.038446413397558e-01,
    0.219781559828021e-01,
    1.337093385877148e-01,
    1.013653067138499e-01,
    1.337093385877147e-01,
    1.219781559828018e-01,
    1.038446413397556e-01,
    8.123807589704955e-02,
    5.649294303335328e-02,
    3.204819670450163e-02,
    1.014277661163293e-02,
    -7.449508483547271e-03,
    -1.960969633644754e-02,
    -2.596439149278415e-02,
    -2.686956962230987e-02,
    -2.329586276880055e-02,
    -1.663806141580318e-02,
    -8.481715163876122e-03,
    -3.642180039146815e-04,
    6.433838249830209e-03,
    1.103840652031031e-02,
    1.305542734154090e-02,
    1.256384744877030e-02,
    1.003709785712436e-02,
    6.212536166683925e-03,
    1.934989864517869e-03,
    -1.997650857782017e-03,
    -4.961811109567867e-03,
    -6.590495820966187e-03,
    -6.801706426747521e-03,
    -5.774285130329611e-03,
    -3.881349490139347e-03,
    -1.597789006581629e-03,
    5.988670154180322e-04,
    2.315743647984139e-03,
    3.305667395036484e-03,
    3.493821608581100e-03,
    2.969009330533590e-03,
    1.945162523354505e-03,
    7.036942342948869e-04,
    -4.702061727525164e-04,
    -1.344436388157660e-03,
    -1.779735081575721e-03,
    -1.746403846176796e-03,
    -1.317153962281502e-03,
    -6.400057619412621e-04,
    1.012674740974558e-04,
    7.298941506695379e-04,
];

pub const NOVS_4: [f32; 45] = [
    1.513371479872678e-03,
    -1.326995792729155e-03,
    -3.621015144071930e-03,
    -2.787570888839776e-03,
    1.459048252073076e-03,
    6.155980343428911e-03,
    6.854011301507485e-03,
    1.241698211362190e-03,
    -8.047637614861131e-03,
    -1.410274148828852e-02,
    -1.028787998211416e-02,
    4.012031706402771e-03,
    2.081104174314789e-02,
    2.706928309826024e-02,
    1.333999910052060e-02,
    -1.758609219931321e-02,
    -4.830192745207036e-02,
    -5.383488762224386e-02,
    -1.544590221435313e-02,
    6.644912393043899e-02,
    1.684400224738754e-01,
    2.529110039620129e-01,
    2.101720695919658e-01,
    2.529110039620124e-01,
    1.684400224738750e-01,
    6.644912393043857e-02,
    -1.544590221435312e-02,
    -5.383488762224471e-02,
    -4.830192745207033e-02,
    -1.758609219931299e-02,
    1.333999910052074e-02,
    2.706928309826031e-02,
    2.081104174314783e-02,
    4.012031706402680e-03,
    -1.028787998211425e-02,
    -1.410274148828852e-02,
    -8.047637614861073e-03,
    1.241698211362233e-03,
    6.854011301507491e-03,
    6.155980343428902e-03,
    1.459048252073038e-03,
    -2.787570888839776e-03,
    -3.621015144071929e-03,
    -1.326995792729144e-03,
    1.513371479872678e-03,
];

pub const NOVS_2: [f32; 23] = [
    3.264402329740409e-03,
    -7.810673340644812e-03,
    3.147224971935993e-03,
    1.478437433127159e-02,
    -1.735907364996029e-02,
    -2.219136532461194e-02,
    4.489024278187957e-02,
    2.877490736520164e-02,
    -1.041891740412316e-01,
    -3.331742393990334e-02,
    3.633318118506540e-01,
    4.533494933313385e-01,
    3.633318118506531e-01,
    -3.331742393990331e-02,
    -1.041891740412316e-01,
    2.877490736520193e-02,
    4.489024278187944e-02,
    -2.219136532461211e-02,
    -1.735907364996017e-02,
    1.478437433127161e-02,
    3.147224971935912e-03,
    -7.810673340644809e-03,
    3.264402329740409e-03,
];

/// Returns the coefficient bank for the given oversampling factor. Callers
/// must only pass 2, 4, or 8 — enforced by `Config::validate`.
pub fn coefficients(novs: u16) -> &'static [f32] {
    match novs {
        8 => &NOVS_8,
        4 => &NOVS_4,
        _ => &NOVS_2,
    }
}
