use crate::cd::ecc::EccTable;
use crate::cd::edc::{EdcTable, edc_matches};
use crate::cd::{
    ECC_P_OFFSET, MODE_OFFSET, MODE1_BYTE, MODE1_EDC_OFFSET, MODE1_RESERVED_OFFSET, MODE2_BYTE,
    MODE2_FORM1_EDC_OFFSET, MODE2_FORM2_EDC_OFFSET, RESERVED_SIZE, SECTOR_SIZE, SUBHEADER_OFFSET,
    SUBHEADER_SIZE, SectorType, has_sync,
};

/// Decides which structural sector type, if any, a raw 2352-byte window is.
///
/// Checks run cheapest first (sync, mode byte, reserved bytes or subheader copy) and only then
/// the EDC and the ECC. Any failed check makes the window a literal.
#[derive(Debug, Clone, Copy)]
pub struct SectorClassifier<'a> {
    edc: &'a EdcTable,
    ecc: &'a EccTable,
}

impl<'a> SectorClassifier<'a> {
    pub fn new(edc: &'a EdcTable, ecc: &'a EccTable) -> Self {
        Self { edc, ecc }
    }

    pub fn classify(&self, sector: &[u8]) -> SectorType {
        if sector.len() < SECTOR_SIZE || !has_sync(sector) {
            return SectorType::Literal;
        }

        match sector[MODE_OFFSET] {
            MODE1_BYTE => self.classify_mode1(sector),
            MODE2_BYTE => self.classify_mode2(sector),
            _ => SectorType::Literal,
        }
    }

    fn classify_mode1(&self, sector: &[u8]) -> SectorType {
        let reserved = &sector[MODE1_RESERVED_OFFSET..MODE1_RESERVED_OFFSET + RESERVED_SIZE];
        if reserved.iter().any(|&b| b != 0) {
            return SectorType::Literal;
        }

        let edc = self.edc.compute(&sector[..MODE1_EDC_OFFSET]);
        if !edc_matches(edc, &sector[MODE1_EDC_OFFSET..]) {
            return SectorType::Literal;
        }

        if !self.ecc.verify(sector, false, &sector[ECC_P_OFFSET..]) {
            return SectorType::Literal;
        }

        SectorType::Mode1
    }

    fn classify_mode2(&self, sector: &[u8]) -> SectorType {
        let (subheader, copy) = sector[SUBHEADER_OFFSET..SUBHEADER_OFFSET + 2 * SUBHEADER_SIZE]
            .split_at(SUBHEADER_SIZE);
        if subheader != copy {
            return SectorType::Literal;
        }

        // A Form 1 candidate whose ECC fails still gets the Form 2 check.
        let form1_edc = self.edc.compute(&sector[SUBHEADER_OFFSET..MODE2_FORM1_EDC_OFFSET]);
        if edc_matches(form1_edc, &sector[MODE2_FORM1_EDC_OFFSET..])
            && self.ecc.verify(sector, true, &sector[ECC_P_OFFSET..])
        {
            return SectorType::Mode2Form1;
        }

        let form2_edc = self.edc.compute(&sector[SUBHEADER_OFFSET..MODE2_FORM2_EDC_OFFSET]);
        if edc_matches(form2_edc, &sector[MODE2_FORM2_EDC_OFFSET..]) {
            return SectorType::Mode2Form2;
        }

        SectorType::Literal
    }
}

impl Default for SectorClassifier<'static> {
    fn default() -> Self {
        Self::new(EdcTable::global(), EccTable::global())
    }
}

/// Classifies `sector` with the process-wide tables. Windows shorter than a raw sector are
/// always literal.
pub fn classify(sector: &[u8]) -> SectorType {
    SectorClassifier::default().classify(sector)
}
