//! Reference data for the Colombian national traffic code
//!
//! Fine tiers and amounts follow Artículo 131, with 2025 values. Everything
//! in this module is immutable, loaded once, and read-only thereafter; the
//! prompt composer renders its numeric tables from here so prompt text and
//! lookup data cannot drift apart.

use serde::{Deserialize, Serialize};

/// SMMLV 2025 (monthly minimum legal wage, COP)
pub const SMMLV_2025: i64 = 1_423_500;

/// SMLDV 2025 = SMMLV / 30 (daily minimum legal wage, COP)
pub const SMLDV_2025: i64 = SMMLV_2025 / 30;

/// Fine tier per Artículo 131
///
/// Five ordinal severity classes, each a fixed multiple of the daily
/// minimum wage.
///
/// # Examples
///
/// ```
/// use vialy::reference::FineTier;
///
/// assert_eq!(FineTier::C.smldv(), 15);
/// assert_eq!(FineTier::C.pesos(), 711_750);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FineTier {
    A,
    B,
    C,
    D,
    E,
}

impl FineTier {
    /// All tiers in ascending severity order
    pub const ALL: [FineTier; 5] = [
        FineTier::A,
        FineTier::B,
        FineTier::C,
        FineTier::D,
        FineTier::E,
    ];

    /// Number of daily minimum wages this tier amounts to
    pub fn smldv(self) -> i64 {
        match self {
            FineTier::A => 4,
            FineTier::B => 8,
            FineTier::C => 15,
            FineTier::D => 30,
            FineTier::E => 45,
        }
    }

    /// Fine amount in Colombian pesos (2025)
    pub fn pesos(self) -> i64 {
        SMLDV_2025 * self.smldv()
    }

    /// Tier letter as it appears in citations
    pub fn code(self) -> char {
        match self {
            FineTier::A => 'A',
            FineTier::B => 'B',
            FineTier::C => 'C',
            FineTier::D => 'D',
            FineTier::E => 'E',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FineTier::A => "Vehículos no automotores o tracción animal",
            FineTier::B => "Infracciones leves",
            FineTier::C => "Infracciones moderadas",
            FineTier::D => "Infracciones graves",
            FineTier::E => "Infracciones muy graves",
        }
    }

    /// Parses a tier letter, case-insensitively
    pub fn from_code(code: char) -> Option<FineTier> {
        match code.to_ascii_uppercase() {
            'A' => Some(FineTier::A),
            'B' => Some(FineTier::B),
            'C' => Some(FineTier::C),
            'D' => Some(FineTier::D),
            'E' => Some(FineTier::E),
            _ => None,
        }
    }
}

/// One recognized violation of the traffic code
///
/// `tier` is `None` where the fine is set by a separate statute (driving
/// under the influence is fined per Art. 152, not the Artículo 131 table).
/// `keywords` drive conversational detection; violations the context
/// tracker never detected in the original deployment carry an empty set.
#[derive(Debug)]
pub struct Violation {
    pub key: &'static str,
    pub description: &'static str,
    pub tier: Option<FineTier>,
    pub statute: &'static str,
    pub extra_sanctions: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

/// Common violations per Artículo 131, in citation order
pub static VIOLATIONS: &[Violation] = &[
    Violation {
        key: "exceso_velocidad",
        description: "Conducir a velocidad superior a la máxima permitida (C.29)",
        tier: Some(FineTier::C),
        statute: "131-C.29",
        extra_sanctions: &[],
        keywords: &["exceso", "velocidad", "rápido", "límite"],
    },
    Violation {
        key: "conducir_sin_licencia",
        description: "Guiar un vehículo sin licencia de conducción (D.1)",
        tier: Some(FineTier::D),
        statute: "131-D.1",
        extra_sanctions: &["Inmovilización del vehículo"],
        keywords: &["sin licencia", "no tiene licencia"],
    },
    Violation {
        key: "no_cinturon",
        description: "No utilizar cinturón de seguridad (C.6)",
        tier: Some(FineTier::C),
        statute: "131-C.6",
        extra_sanctions: &[],
        keywords: &["cinturón", "cinturon"],
    },
    Violation {
        key: "semaforo_rojo",
        description: "No detenerse ante luz roja o señal de PARE (D.4)",
        tier: Some(FineTier::D),
        statute: "131-D.4",
        extra_sanctions: &["Inmovilización (motos)"],
        keywords: &["semáforo", "semaforo", "luz roja"],
    },
    Violation {
        key: "conducir_embriagado",
        description: "Conducir bajo efectos del alcohol (F - Art. 152)",
        tier: None,
        statute: "131-F / Art. 152",
        extra_sanctions: &[
            "Suspensión de licencia",
            "Inmovilización del vehículo",
            "Multa según nivel de alcoholemia",
        ],
        keywords: &["embriagado", "alcohol", "borracho"],
    },
    Violation {
        key: "no_soat",
        description: "Conducir sin portar SOAT (D.2)",
        tier: Some(FineTier::D),
        statute: "131-D.2",
        extra_sanctions: &["Inmovilización del vehículo"],
        keywords: &["soat", "seguro"],
    },
    Violation {
        key: "celular_conduciendo",
        description: "Usar celular mientras conduce sin manos libres (C.38)",
        tier: Some(FineTier::C),
        statute: "131-C.38",
        extra_sanctions: &[],
        keywords: &["celular", "teléfono", "telefono"],
    },
    Violation {
        key: "estacionar_prohibido",
        description: "Estacionar en sitios prohibidos (C.2)",
        tier: Some(FineTier::C),
        statute: "131-C.2",
        extra_sanctions: &[],
        keywords: &["estacionar", "estacionamiento", "parqueo", "aparcar"],
    },
    Violation {
        key: "sin_licencia_porte",
        description: "Conducir sin llevar consigo la licencia (B.1)",
        tier: Some(FineTier::B),
        statute: "131-B.1",
        extra_sanctions: &[],
        keywords: &[],
    },
    Violation {
        key: "sentido_contrario",
        description: "Transitar en sentido contrario (D.3)",
        tier: Some(FineTier::D),
        statute: "131-D.3",
        extra_sanctions: &["Inmovilización (motos)"],
        keywords: &["sentido contrario", "contravía", "contravia"],
    },
    Violation {
        key: "maniobras_peligrosas",
        description: "Maniobras altamente peligrosas (D.7)",
        tier: Some(FineTier::D),
        statute: "131-D.7",
        extra_sanctions: &["Inmovilización (motos)"],
        keywords: &[],
    },
    Violation {
        key: "revision_tecnomecanica",
        description: "No realizar revisión técnico-mecánica (C.35)",
        tier: Some(FineTier::C),
        statute: "131-C.35",
        extra_sanctions: &["Inmovilización del vehículo"],
        keywords: &["tecnomecánica", "tecnomecanica", "revisión técnica"],
    },
];

/// Looks up a violation by its key
pub fn violation(key: &str) -> Option<&'static Violation> {
    VIOLATIONS.iter().find(|v| v.key == key)
}

/// Scans lower-cased `text` for violation keywords; returns matched keys in
/// table order, at most once each.
pub fn detect_violations(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    VIOLATIONS
        .iter()
        .filter(|v| v.keywords.iter().any(|kw| lower.contains(kw)))
        .map(|v| v.key)
        .collect()
}

/// A document drivers must carry
#[derive(Debug)]
pub struct RequiredDocument {
    pub name: &'static str,
    pub description: &'static str,
}

pub static REQUIRED_DOCUMENTS: &[RequiredDocument] = &[
    RequiredDocument {
        name: "Licencia de conducción",
        description: "Vigente y correspondiente a la categoría del vehículo",
    },
    RequiredDocument {
        name: "Documento de identidad",
        description: "Cédula de ciudadanía o extranjería",
    },
    RequiredDocument {
        name: "SOAT",
        description: "Seguro Obligatorio de Accidentes de Tránsito vigente",
    },
    RequiredDocument {
        name: "Tarjeta de propiedad",
        description: "Documento de propiedad del vehículo",
    },
    RequiredDocument {
        name: "Certificado de revisión técnico-mecánica",
        description: "Para vehículos particulares de más de 2 años",
    },
];

/// Approximate 2025 cost range for a common procedure, in pesos
#[derive(Debug)]
pub struct ProcedureCost {
    pub key: &'static str,
    pub description: &'static str,
    pub min_pesos: i64,
    pub max_pesos: i64,
}

pub static PROCEDURE_COSTS: &[ProcedureCost] = &[
    ProcedureCost {
        key: "licencia_nueva",
        description: "Obtener licencia nueva por primera vez",
        min_pesos: 350_000,
        max_pesos: 500_000,
    },
    ProcedureCost {
        key: "renovacion_licencia",
        description: "Renovación de licencia de conducción",
        min_pesos: 200_000,
        max_pesos: 300_000,
    },
    ProcedureCost {
        key: "soat_moto",
        description: "SOAT para motocicleta",
        min_pesos: 350_000,
        max_pesos: 450_000,
    },
    ProcedureCost {
        key: "soat_carro",
        description: "SOAT para automóvil",
        min_pesos: 500_000,
        max_pesos: 800_000,
    },
    ProcedureCost {
        key: "revision_tecnomecanica",
        description: "Revisión técnico-mecánica",
        min_pesos: 70_000,
        max_pesos: 150_000,
    },
    ProcedureCost {
        key: "examen_medico",
        description: "Examen médico para licencia",
        min_pesos: 40_000,
        max_pesos: 80_000,
    },
    ProcedureCost {
        key: "curso_conduccion",
        description: "Curso de conducción completo",
        min_pesos: 800_000,
        max_pesos: 1_500_000,
    },
];

/// Speed limits by zone, km/h
pub static SPEED_LIMITS: &[(&str, u32)] = &[
    ("zona_escolar", 30),
    ("zona_residencial", 30),
    ("zona_urbana", 50),
    ("zona_rural", 80),
    ("autopista", 100),
    ("autopista_doble_calzada", 120),
];

/// License point scheme: start at 100, license suspended at 0, full
/// recovery after 12 months without infractions.
#[derive(Debug, Clone, Copy)]
pub struct LicensePoints {
    pub initial: u32,
    pub suspension_at: u32,
    pub recovery_months: u32,
}

pub const LICENSE_POINTS: LicensePoints = LicensePoints {
    initial: 100,
    suspension_at: 0,
    recovery_months: 12,
};

/// Formats a peso amount with thousands separators, e.g. `$711,750`
///
/// # Examples
///
/// ```
/// use vialy::reference::format_pesos;
///
/// assert_eq!(format_pesos(711_750), "$711,750");
/// assert_eq!(format_pesos(1_423_500), "$1,423,500");
/// ```
pub fn format_pesos(value: i64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

/// Renders the Artículo 131 fine-tier table as prompt-ready lines
pub fn fine_tier_table() -> String {
    FineTier::ALL
        .iter()
        .map(|t| {
            format!(
                "   - Tipo {} = {} SMLDV = {} COP ({})",
                t.code(),
                t.smldv(),
                format_pesos(t.pesos()),
                t.description().to_lowercase()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the common-violation value list as prompt-ready lines
pub fn violation_values_table() -> String {
    VIOLATIONS
        .iter()
        .filter_map(|v| {
            let tier = v.tier?;
            let extra = if v.extra_sanctions.is_empty() {
                String::new()
            } else {
                format!(" + {}", v.extra_sanctions.join(", ").to_lowercase())
            };
            Some(format!(
                "   - {}: Tipo {} = {}{}",
                v.description,
                tier.code(),
                format_pesos(tier.pesos()),
                extra
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the mandatory-document list as prompt-ready lines
pub fn required_documents_list() -> String {
    REQUIRED_DOCUMENTS
        .iter()
        .map(|d| format!("- {}: {}", d.name, d.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the 2025 procedure cost ranges as prompt-ready lines
pub fn procedure_costs_list() -> String {
    PROCEDURE_COSTS
        .iter()
        .map(|c| {
            format!(
                "- {}: {} - {}",
                c.description,
                format_pesos(c.min_pesos),
                format_pesos(c.max_pesos)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
