
use crate::data_types::risk_info::{Phenotype, RiskLabel, Severity};
use crate::data_types::risk_info::Phenotype::{IntermediateMetabolizer as IM, NormalMetabolizer as NM, PoorMetabolizer as PM, RapidMetabolizer as RM, UltrarapidMetabolizer as URM};

// gene names to prevent dev typos
pub const CYP2C19: &str = "CYP2C19";
pub const CYP2C9: &str = "CYP2C9";
pub const CYP2D6: &str = "CYP2D6";
pub const DPYD: &str = "DPYD";
pub const SLCO1B1: &str = "SLCO1B1";
pub const TPMT: &str = "TPMT";

/// Fallback list when a drug has no alternatives registered
pub const DEFAULT_ALTERNATIVE: &str = "Consult your physician";

/// Static definition of a single gene, in registration order
pub struct GeneDefinitionConst {
    pub gene: &'static str,
    /// Chromosome without any "chr" prefix
    pub chromosome: &'static str,
    pub description: &'static str,
    /// Drugs covered by this gene, the first one is the guideline source
    pub drugs: &'static [&'static str],
    /// Known functional rsIDs with a short description
    pub functional_variants: &'static [(&'static str, &'static str)]
}

/// Static definition of a single CPIC gene-drug guideline
pub struct GuidelineConst {
    pub gene: &'static str,
    pub drug: &'static str,
    pub url: &'static str,
    pub diplotypes: &'static [(&'static str, Phenotype)],
    /// (phenotype, label, severity, action, alternative)
    pub risks: &'static [(Phenotype, RiskLabel, Severity, &'static str, Option<&'static str>)],
    pub common_variants: &'static [&'static str]
}

pub const GENE_DEFINITIONS: &[GeneDefinitionConst] = &[
    GeneDefinitionConst {
        gene: CYP2D6,
        chromosome: "22",
        description: "an enzyme responsible for metabolizing about 25% of commonly prescribed drugs",
        drugs: &["CODEINE", "TRAMADOL", "METOPROLOL"],
        functional_variants: &[
            ("rs3892097", "*4 (splice defect)"),
            ("rs1065852", "*10"),
            ("rs5030655", "*6"),
            ("rs5030867", "*14"),
            ("rs28371725", "*2"),
            ("rs28413332", "*17"),
            ("rs28413331", "*29")
        ]
    },
    GeneDefinitionConst {
        gene: CYP2C19,
        chromosome: "10",
        description: "an enzyme involved in activating or metabolizing many drugs including clopidogrel and proton pump inhibitors",
        drugs: &["CLOPIDOGREL", "OMEPRAZOLE", "LANSOPRAZOLE"],
        functional_variants: &[
            ("rs4244285", "*2 (loss of function)"),
            ("rs4986893", "*3 (loss of function)"),
            ("rs12248560", "*17 (gain of function)"),
            ("rs28399504", "*4"),
            ("rs41291556", "*5")
        ]
    },
    GeneDefinitionConst {
        gene: CYP2C9,
        chromosome: "10",
        description: "an enzyme that metabolizes warfarin and other drugs",
        drugs: &["WARFARIN", "LOSARTAN", "PHENYTOIN"],
        functional_variants: &[
            ("rs1799853", "*2 (reduced function)"),
            ("rs1057910", "*3 (no function)"),
            ("rs28371686", "*5"),
            ("rs4917639", "*11"),
            ("rs7900194", "*8")
        ]
    },
    GeneDefinitionConst {
        gene: SLCO1B1,
        chromosome: "12",
        description: "a transporter protein that affects statin uptake and efficacy",
        drugs: &["SIMVASTATIN", "ATORVASTATIN", "ROSUVASTATIN"],
        functional_variants: &[
            ("rs4149056", "*5 (reduced function)"),
            ("rs4149015", "*15"),
            ("rs2304130", "*14"),
            ("rs4363657", "*1a"),
            ("rs4149268", "*1b")
        ]
    },
    GeneDefinitionConst {
        gene: TPMT,
        chromosome: "6",
        description: "an enzyme that metabolizes thiopurine drugs used in immunosuppression",
        drugs: &["AZATHIOPRINE", "MERCAPTOPURINE", "THIOGUANINE"],
        functional_variants: &[
            ("rs1800462", "*3A (no function)"),
            ("rs1800588", "*3B"),
            ("rs1142345", "*3B"),
            ("rs1800589", "*2"),
            ("rs12239046", "*4")
        ]
    },
    GeneDefinitionConst {
        gene: DPYD,
        chromosome: "1",
        description: "an enzyme responsible for metabolizing fluorouracil and other fluoropyrimidines",
        drugs: &["FLUOROURACIL", "CAPECITABINE", "TEGAFUR"],
        functional_variants: &[
            ("rs3918290", "*2A (no function)"),
            ("rs55886062", "*13"),
            ("rs67376798", "*14"),
            ("rs75017182", "*1"),
            ("rs56038477", "*5")
        ]
    }
];

/// rsID -> (star allele, function); this is global across genes and drives both diplotyping and confidence
pub const STAR_ALLELE_VARIANTS: &[(&str, &str, &str)] = &[
    ("rs3892097", "*4", "non-functional"),
    ("rs1065852", "*10", "reduced"),
    ("rs5030655", "*6", "non-functional"),
    ("rs5030867", "*14", "non-functional"),
    ("rs28371725", "*2", "normal"),
    ("rs4244285", "*2", "non-functional"),
    ("rs4986893", "*3", "non-functional"),
    ("rs12248560", "*17", "gain-of-function"),
    ("rs1799853", "*2", "reduced"),
    ("rs1057910", "*3", "non-functional"),
    ("rs4149056", "*5", "reduced"),
    ("rs1800462", "*3A", "non-functional"),
    ("rs1800588", "*3B", "non-functional"),
    ("rs1142345", "*3B", "non-functional"),
    ("rs3918290", "*2A", "non-functional"),
    ("rs55886062", "*13", "non-functional"),
    ("rs67376798", "*14", "reduced")
];

pub const ALTERNATIVE_DRUGS: &[(&str, &[&str])] = &[
    ("CODEINE", &["Morphine", "Hydromorphone", "Non-Opioid Analgesic (Ibuprofen/Acetaminophen)"]),
    ("TRAMADOL", &["Oxycodone", "Non-Opioid Analgesic"]),
    ("METOPROLOL", &["Atenolol", "Bisoprolol", "Carvedilol"]),
    ("CLOPIDOGREL", &["Prasugrel", "Ticagrelor", "Aspirin"]),
    ("OMEPRAZOLE", &["Pantoprazole", "Rabeprazole", "Famotidine"]),
    ("LANSOPRAZOLE", &["Pantoprazole", "Rabeprazole", "Famotidine"]),
    ("WARFARIN", &["Apixaban", "Rivaroxaban", "Dabigatran"]),
    ("LOSARTAN", &["Valsartan", "Irbesartan", "Candesartan"]),
    ("PHENYTOIN", &["Levetiracetam", "Lamotrigine", "Carbamazepine"]),
    ("SIMVASTATIN", &["Atorvastatin", "Rosuvastatin", "Pravastatin"]),
    ("ATORVASTATIN", &["Rosuvastatin", "Pravastatin", "Fluvastatin"]),
    ("ROSUVASTATIN", &["Atorvastatin", "Pravastatin", "Fluvastatin"]),
    ("AZATHIOPRINE", &["Mycophenolate Mofetil", "Tacrolimus", "Methotrexate"]),
    ("MERCAPTOPURINE", &["Mycophenolate Mofetil", "Azathioprine"]),
    ("THIOGUANINE", &["Mycophenolate Mofetil", "Azathioprine"]),
    ("FLUOROURACIL", &["Non-FU containing regimen", "Consult Oncology", "Capecitabine (with dose adjustment)"]),
    ("CAPECITABINE", &["Non-FU containing regimen", "Consult Oncology"]),
    ("TEGAFUR", &["Non-FU containing regimen", "Consult Oncology"])
];

// most genes share the same recommendation for all the non-reduced phenotypes
const STANDARD_DOSING: &str = "Use standard dosing";
const LABEL_DOSING: &str = "Use label-recommended dosing";
const INR_DOSING: &str = "Use standard dosing with routine INR monitoring";

pub const CPIC_GUIDELINES: &[GuidelineConst] = &[
    GuidelineConst {
        gene: CYP2D6,
        drug: "CODEINE",
        url: "https://cpicpgx.org/guidelines/cyp2d6-codeine-guideline/",
        diplotypes: &[
            ("*1/*1", NM), ("*1/*2", RM), ("*1/*3", IM), ("*1/*4", PM), ("*2/*2", RM),
            ("*2/*3", IM), ("*2/*4", PM), ("*3/*3", PM), ("*3/*4", PM), ("*4/*4", PM),
            ("*1xN/*1", URM), ("*1xN/*2", URM), ("*2xN/*2", URM)
        ],
        risks: &[
            (PM, RiskLabel::Toxic, Severity::Critical, "Avoid Codeine - Risk of life-threatening toxicity", Some("Morphine or Non-Opioid Analgesic")),
            (IM, RiskLabel::AdjustDosage, Severity::Moderate, "Use lowest effective dose, consider alternative", Some("Tramadol with monitoring or Non-Opioid")),
            (NM, RiskLabel::Safe, Severity::None, LABEL_DOSING, None),
            (RM, RiskLabel::Safe, Severity::None, LABEL_DOSING, None),
            (URM, RiskLabel::Ineffective, Severity::Critical, "Avoid Codeine - Risk of inadequate analgesia", Some("Morphine or Non-Opioid Analgesic"))
        ],
        common_variants: &["rs3892097", "rs1065852", "rs5030655", "rs5030867", "rs28371725", "rs28413332", "rs28413331"]
    },
    GuidelineConst {
        gene: CYP2C19,
        drug: "CLOPIDOGREL",
        url: "https://cpicpgx.org/guidelines/cyp2c19-clopidogrel-guideline/",
        diplotypes: &[
            ("*1/*1", NM), ("*1/*2", PM), ("*1/*3", IM), ("*2/*2", PM),
            ("*2/*3", PM), ("*3/*3", PM), ("*17/*17", RM), ("*1/*17", RM)
        ],
        risks: &[
            (PM, RiskLabel::Ineffective, Severity::High, "Avoid Clopidogrel - Poor activation", Some("Prasugrel or Ticagrelor (if no contraindication)")),
            (IM, RiskLabel::AdjustDosage, Severity::Moderate, "Consider alternative antiplatelet therapy", Some("Prasugrel or Ticagrelor")),
            (NM, RiskLabel::Safe, Severity::None, LABEL_DOSING, None),
            (RM, RiskLabel::Safe, Severity::None, LABEL_DOSING, None),
            (URM, RiskLabel::Safe, Severity::None, LABEL_DOSING, None)
        ],
        common_variants: &["rs4244285", "rs4986893", "rs12248560", "rs28399504", "rs41291556"]
    },
    GuidelineConst {
        gene: CYP2C9,
        drug: "WARFARIN",
        url: "https://cpicpgx.org/guidelines/cyp2c9-warfarin-guideline/",
        diplotypes: &[
            ("*1/*1", NM), ("*1/*2", IM), ("*1/*3", IM), ("*2/*2", PM), ("*2/*3", PM), ("*3/*3", PM)
        ],
        risks: &[
            (PM, RiskLabel::Toxic, Severity::Critical, "Reduce warfarin dose by 50-70%, frequent INR monitoring", Some("Consider alternative anticoagulant (e.g., apixaban, rivaroxaban)")),
            (IM, RiskLabel::AdjustDosage, Severity::Moderate, "Reduce initial dose, frequent INR monitoring", None),
            (NM, RiskLabel::Safe, Severity::None, INR_DOSING, None),
            (RM, RiskLabel::Safe, Severity::None, INR_DOSING, None),
            (URM, RiskLabel::Safe, Severity::None, INR_DOSING, None)
        ],
        common_variants: &["rs1799853", "rs1057910", "rs28371686", "rs4917639", "rs7900194"]
    },
    GuidelineConst {
        gene: SLCO1B1,
        drug: "SIMVASTATIN",
        url: "https://cpicpgx.org/guidelines/slco1b1-simvastatin-guideline/",
        diplotypes: &[
            ("*1/*1", NM), ("*1/*5", IM), ("*5/*5", PM), ("*1/*15", IM), ("*15/*15", PM)
        ],
        risks: &[
            (PM, RiskLabel::Toxic, Severity::High, "Avoid simvastatin >20mg daily, use alternate statin", Some("Atorvastatin, Rosuvastatin, or Pravastatin")),
            (IM, RiskLabel::AdjustDosage, Severity::Moderate, "Use simvastatin 20mg max, consider alternate statin", Some("Atorvastatin, Rosuvastatin, or Pravastatin")),
            (NM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None),
            (RM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None),
            (URM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None)
        ],
        common_variants: &["rs4149056", "rs4149015", "rs2304130", "rs4363657", "rs4149268"]
    },
    GuidelineConst {
        gene: TPMT,
        drug: "AZATHIOPRINE",
        url: "https://cpicpgx.org/guidelines/tpmt-azathioprine-guideline/",
        diplotypes: &[
            ("*1/*1", NM), ("*1/*3A", IM), ("*1/*3B", IM), ("*1/*3C", IM), ("*3A/*3A", PM),
            ("*3A/*3B", PM), ("*3B/*3B", PM), ("*3A/*3C", PM), ("*3C/*3C", PM)
        ],
        risks: &[
            (PM, RiskLabel::Toxic, Severity::Critical, "Avoid azathioprine - severe myelosuppression risk", Some("Consider mycophenolate mofetil or tacrolimus")),
            (IM, RiskLabel::AdjustDosage, Severity::High, "Reduce dose to 30-50% of normal, monitor closely", None),
            (NM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None),
            (RM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None),
            (URM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None)
        ],
        common_variants: &["rs1800462", "rs1800588", "rs1142345", "rs1800589", "rs12239046"]
    },
    GuidelineConst {
        gene: DPYD,
        drug: "FLUOROURACIL",
        url: "https://cpicpgx.org/guidelines/dpd-fluorouracil-guideline/",
        diplotypes: &[
            ("*1/*1", NM), ("*1/*2", IM), ("*1/*13", IM), ("*1/*14", IM),
            ("*2/*2", PM), ("*13/*13", PM), ("*1A/*1", NM), ("*1A/*2", IM)
        ],
        risks: &[
            (PM, RiskLabel::Toxic, Severity::Critical, "Avoid fluorouracil - severe toxicity risk", Some("Non-FU containing regimen, consult oncology")),
            (IM, RiskLabel::AdjustDosage, Severity::High, "Reduce initial dose by 50%, monitor closely", None),
            (NM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None),
            (RM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None),
            (URM, RiskLabel::Safe, Severity::None, STANDARD_DOSING, None)
        ],
        common_variants: &["rs3918290", "rs55886062", "rs67376798", "rs75017182", "rs56038477"]
    }
];
