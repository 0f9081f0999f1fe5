#![allow(dead_code)]

use sabia::domain::error::SabiaError;
use sabia::domain::period::Quarter;
use sabia::domain::record::{BorrowerRecord, GrantRecord, RowStore, StockRecord};
use sabia::ports::data_port::{DataPort, LoadOutcome};
use std::fs;
use std::path::Path;

pub fn q(year: i32, index: u8) -> Quarter {
    Quarter::new(year, index).unwrap()
}

pub struct MockDataPort {
    pub store: RowStore,
    pub skipped: usize,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(store: RowStore) -> Self {
        Self {
            store,
            skipped: 0,
            error: None,
        }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), SabiaError> {
        match &self.error {
            Some(reason) => Err(SabiaError::DataLoad {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn load_borrowers(&self) -> Result<LoadOutcome<BorrowerRecord>, SabiaError> {
        self.check()?;
        Ok(LoadOutcome::new(self.store.borrowers.clone(), self.skipped))
    }

    fn load_stock(&self) -> Result<LoadOutcome<StockRecord>, SabiaError> {
        self.check()?;
        Ok(LoadOutcome::new(self.store.stock.clone(), 0))
    }

    fn load_grants(&self) -> Result<LoadOutcome<GrantRecord>, SabiaError> {
        self.check()?;
        Ok(LoadOutcome::new(self.store.grants.clone(), 0))
    }
}

pub fn borrower(
    quarter: Quarter,
    size: &str,
    gender: &str,
    region: &str,
    state: &str,
    count: f64,
) -> BorrowerRecord {
    BorrowerRecord {
        quarter,
        size: size.into(),
        gender: gender.into(),
        region: region.into(),
        state: state.into(),
        borrowers: count,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn stock(
    quarter: Quarter,
    size: &str,
    gender: &str,
    region: &str,
    state: &str,
    balance: f64,
    delinquent: f64,
    rate: f64,
) -> StockRecord {
    StockRecord {
        quarter,
        size: size.into(),
        gender: gender.into(),
        region: region.into(),
        state: state.into(),
        origin: "Recursos Livres".into(),
        modality: "Capital de Giro".into(),
        balance,
        delinquent,
        operations: 2.0,
        rate_numerator: rate * balance,
        rate_denominator: balance,
    }
}

pub fn grant(
    quarter: Quarter,
    size: &str,
    gender: &str,
    region: &str,
    state: &str,
    granted: f64,
) -> GrantRecord {
    GrantRecord {
        quarter,
        size: size.into(),
        gender: gender.into(),
        region: region.into(),
        state: state.into(),
        origin: "Recursos Direcionados".into(),
        modality: "Investimento".into(),
        granted,
    }
}

/// Six quarters (2023-Q1 to 2024-Q2) over three states in two regions, with
/// steady growth so forecasts have a clear trend.
pub fn sample_store() -> RowStore {
    let cells = [
        ("MEI", "Feminino", "Sudeste", "SP", 100.0),
        ("Micro", "Masculino", "Sudeste", "RJ", 60.0),
        ("Pequeno", "Feminino", "Nordeste", "BA", 40.0),
    ];
    let mut store = RowStore::default();
    for step in 0..6 {
        let quarter = q(2023, 1).offset(step);
        let growth = 1.0 + 0.05 * step as f64;
        for (size, gender, region, state, base) in cells {
            let value = base * growth;
            store
                .borrowers
                .push(borrower(quarter, size, gender, region, state, value));
            store.stock.push(stock(
                quarter,
                size,
                gender,
                region,
                state,
                value * 1000.0,
                value * 30.0,
                0.2,
            ));
            store
                .grants
                .push(grant(quarter, size, gender, region, state, value * 250.0));
        }
    }
    store
}

/// Writes the three CSV extracts for a small dataset into `dir`.
pub fn write_csv_fixture(dir: &Path) {
    fs::write(
        dir.join("tomadores.csv"),
        "MES,PORTE,SEXO,REGIAO,UF,QTDE_EMPRESAS_TOMADORAS\n\
         2024-01,MEI,Feminino,Sudeste,SP,100\n\
         2024-02,MEI,Feminino,Sudeste,SP,20\n\
         2024-04,Micro,Masculino,Sul,RS,50\n\
         2024-07,Micro,Masculino,Sul,RS,70\n\
         2024-07,MEI,Feminino,Sudeste,SP,not-a-number\n",
    )
    .unwrap();
    fs::write(
        dir.join("estoque.csv"),
        "MES,PORTE,SEXO,REGIAO,UF,ORIGEM,MODALIDADE,SALDO_CARTEIRA_CREDITO,SALDO_INADIMPLENCIA,QTD_OPERACOES,NUM_TAXA_POND,DEN_TAXA_POND\n\
         2024-03,MEI,Feminino,Sudeste,SP,Recursos Livres,Capital de Giro,1000,50,10,200,1000\n\
         2024-06,MEI,Feminino,Sudeste,SP,Recursos Livres,Capital de Giro,1200,60,12,240,1200\n\
         2024-06,Micro,Masculino,Sul,RS,Recursos Direcionados,Investimento,800,8,4,120,800\n\
         2024-09,Micro,Masculino,Sul,RS,Recursos Direcionados,Investimento,1000,20,5,150,1000\n",
    )
    .unwrap();
    fs::write(
        dir.join("concessao.csv"),
        "TRIMESTRE,PORTE,SEXO,REGIAO,UF,ORIGEM,MODALIDADE,CONCESSAO\n\
         2024-Q1,MEI,Feminino,Sudeste,SP,Recursos Livres,Capital de Giro,300\n\
         2024-Q2,Micro,Masculino,Sul,RS,Recursos Direcionados,Investimento,400\n\
         2024-Q3,Micro,Masculino,Sul,RS,Recursos Direcionados,Investimento,500\n",
    )
    .unwrap();
}
