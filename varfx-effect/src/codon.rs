//! Standard genetic code (NCBI translation table 1) and small sequence
//! helpers used by coding-change classification.

pub const CODON_SIZE: u32 = 3;

/// Map nucleotide byte to index: A=0, C=1, G=2, T/U=3.
fn nucleotide_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        _ => None,
    }
}

/// Index = first*16 + second*4 + third, nucleotide order A C G T.
const CODON_TABLE: [u8; 64] = [
    // AAA AAC AAG AAT  ACA ACC ACG ACT  AGA AGC AGG AGT  ATA ATC ATG ATT
    b'K', b'N', b'K', b'N', b'T', b'T', b'T', b'T', b'R', b'S', b'R', b'S', b'I', b'I', b'M', b'I',
    // CAA CAC CAG CAT  CCA CCC CCG CCT  CGA CGC CGG CGT  CTA CTC CTG CTT
    b'Q', b'H', b'Q', b'H', b'P', b'P', b'P', b'P', b'R', b'R', b'R', b'R', b'L', b'L', b'L', b'L',
    // GAA GAC GAG GAT  GCA GCC GCG GCT  GGA GGC GGG GGT  GTA GTC GTG GTT
    b'E', b'D', b'E', b'D', b'A', b'A', b'A', b'A', b'G', b'G', b'G', b'G', b'V', b'V', b'V', b'V',
    // TAA TAC TAG TAT  TCA TCC TCG TCT  TGA TGC TGG TGT  TTA TTC TTG TTT
    b'*', b'Y', b'*', b'Y', b'S', b'S', b'S', b'S', b'*', b'C', b'W', b'C', b'L', b'F', b'L', b'F',
];

/// Start codons of table 1.
const START_CODONS: [&str; 3] = ["ATG", "CTG", "TTG"];

/// Translate one codon, `X` for incomplete or ambiguous codons.
pub fn translate_codon(codon: &[u8]) -> char {
    if codon.len() != 3 {
        return 'X';
    }
    match (
        nucleotide_index(codon[0]),
        nucleotide_index(codon[1]),
        nucleotide_index(codon[2]),
    ) {
        (Some(a), Some(b), Some(c)) => CODON_TABLE[a * 16 + b * 4 + c] as char,
        _ => 'X',
    }
}

/// Translate a run of codons; trailing bases that do not fill a codon are ignored.
pub fn translate(codons: &str) -> String {
    codons
        .as_bytes()
        .chunks_exact(3)
        .map(translate_codon)
        .collect()
}

pub fn is_start(codon: &str) -> bool {
    let codon = codon.to_ascii_uppercase();
    START_CODONS.iter().any(|s| codon.starts_with(s))
}

/// Does any codon in the run translate to a stop?
pub fn is_stop(codons: &str) -> bool {
    translate(codons).contains('*')
}

pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        other => other,
    }
}

pub fn reverse_complement(seq: &str) -> String {
    seq.bytes().rev().map(|b| complement(b) as char).collect()
}
