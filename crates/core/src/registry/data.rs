//! Built-in category tables: profession aliases, craft keyword indexes,
//! knowledge job-type indexes, default item lists and the banned craft
//! vocabulary. Everything here is data; adding a category never touches
//! control flow.

use super::{CategoryDef, CategoryKind, JobTypeEntry, KeywordGroup, TemplateItem};

/// Profession spellings mapped onto category ids. Category ids resolve to
/// themselves without needing an entry here.
pub(super) const PROFESSION_ALIASES: &[(&str, &str)] = &[
    ("idraulico", "idraulico"),
    ("termoidraulico", "idraulico"),
    ("installatore termoidraulico", "idraulico"),
    ("elettricista", "elettricista"),
    ("impiantista elettrico", "elettricista"),
    ("imbianchino", "imbianchino"),
    ("pittore edile", "imbianchino"),
    ("decoratore", "imbianchino"),
    ("muratore", "muratore"),
    ("impresa edile", "muratore"),
    ("falegname", "falegname"),
    ("serramentista", "falegname"),
    ("consulente", "consulenti"),
    ("consulenza", "consulenti"),
    ("consulente aziendale", "consulenti"),
    ("avvocato", "avvocato"),
    ("studio legale", "avvocato"),
    ("legale", "avvocato"),
    ("architetto", "architetto"),
    ("studio di architettura", "architetto"),
    ("commercialista", "commercialista"),
    ("ragioniere", "commercialista"),
    ("consulente fiscale", "commercialista"),
];

/// Craft vocabulary that must never appear in a knowledge-profession quote:
/// labor, materials, transport, disposal and installation jargon.
pub(super) const BANNED_CRAFT_TERMS: &[&str] = &[
    "manodopera",
    "materiali",
    "materiale",
    "trasporto",
    "smaltimento",
    "posa in opera",
    "installazione",
    "cantiere",
    "demolizione",
    "ponteggio",
    "tubazioni",
    "cablaggio",
    "intonaco",
    "tinteggiatura",
    "muratura",
];

const IDRAULICO_BAGNO: &[TemplateItem] = &[
    TemplateItem { description: "Smontaggio e smaltimento sanitari esistenti", quantity: 1, base_cost: 180.0 },
    TemplateItem { description: "Fornitura e posa nuovi sanitari", quantity: 1, base_cost: 650.0 },
    TemplateItem { description: "Rifacimento impianto idrico bagno", quantity: 1, base_cost: 900.0 },
    TemplateItem { description: "Piatto doccia e rubinetteria", quantity: 1, base_cost: 480.0 },
];

const IDRAULICO_CALDAIA: &[TemplateItem] = &[
    TemplateItem { description: "Fornitura caldaia a condensazione", quantity: 1, base_cost: 1450.0 },
    TemplateItem { description: "Installazione e collaudo caldaia", quantity: 1, base_cost: 420.0 },
    TemplateItem { description: "Smaltimento vecchio generatore", quantity: 1, base_cost: 90.0 },
];

const IDRAULICO_PERDITE: &[TemplateItem] = &[
    TemplateItem { description: "Ricerca perdita con strumentazione", quantity: 1, base_cost: 160.0 },
    TemplateItem { description: "Riparazione tubazione danneggiata", quantity: 1, base_cost: 240.0 },
    TemplateItem { description: "Ripristino murario localizzato", quantity: 1, base_cost: 180.0 },
];

const IDRAULICO_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Manodopera idraulica", quantity: 1, base_cost: 280.0 },
    TemplateItem { description: "Materiali di consumo idraulici", quantity: 1, base_cost: 120.0 },
    TemplateItem { description: "Uscita e trasporto attrezzatura", quantity: 1, base_cost: 60.0 },
];

const ELETTRICISTA_IMPIANTO: &[TemplateItem] = &[
    TemplateItem { description: "Rifacimento quadro elettrico", quantity: 1, base_cost: 520.0 },
    TemplateItem { description: "Cablaggio punti luce e prese", quantity: 10, base_cost: 45.0 },
    TemplateItem { description: "Certificazione impianto a norma", quantity: 1, base_cost: 180.0 },
];

const ELETTRICISTA_DOMOTICA: &[TemplateItem] = &[
    TemplateItem { description: "Fornitura centralina domotica", quantity: 1, base_cost: 680.0 },
    TemplateItem { description: "Configurazione scenari e app", quantity: 1, base_cost: 220.0 },
];

const ELETTRICISTA_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Manodopera elettricista", quantity: 1, base_cost: 260.0 },
    TemplateItem { description: "Materiale elettrico di consumo", quantity: 1, base_cost: 140.0 },
    TemplateItem { description: "Uscita e verifica impianto", quantity: 1, base_cost: 70.0 },
];

const IMBIANCHINO_TINTEGGIATURA: &[TemplateItem] = &[
    TemplateItem { description: "Preparazione fondi e stuccatura", quantity: 1, base_cost: 220.0 },
    TemplateItem { description: "Tinteggiatura pareti due mani", quantity: 1, base_cost: 540.0 },
    TemplateItem { description: "Protezione pavimenti e infissi", quantity: 1, base_cost: 90.0 },
];

const IMBIANCHINO_CARTONGESSO: &[TemplateItem] = &[
    TemplateItem { description: "Fornitura e posa controsoffitto in cartongesso", quantity: 1, base_cost: 620.0 },
    TemplateItem { description: "Rasatura e finitura", quantity: 1, base_cost: 260.0 },
];

const IMBIANCHINO_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Manodopera imbianchino", quantity: 1, base_cost: 240.0 },
    TemplateItem { description: "Pitture e materiali", quantity: 1, base_cost: 160.0 },
    TemplateItem { description: "Teli, nastri e smaltimento", quantity: 1, base_cost: 50.0 },
];

const MURATORE_RISTRUTTURAZIONE: &[TemplateItem] = &[
    TemplateItem { description: "Demolizioni e rimozioni", quantity: 1, base_cost: 850.0 },
    TemplateItem { description: "Opere murarie e tramezzi", quantity: 1, base_cost: 1400.0 },
    TemplateItem { description: "Massetto e sottofondi", quantity: 1, base_cost: 760.0 },
    TemplateItem { description: "Smaltimento macerie in discarica", quantity: 1, base_cost: 320.0 },
];

const MURATORE_PAVIMENTI: &[TemplateItem] = &[
    TemplateItem { description: "Rimozione pavimento esistente", quantity: 1, base_cost: 380.0 },
    TemplateItem { description: "Posa nuovo pavimento", quantity: 1, base_cost: 920.0 },
];

const MURATORE_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Manodopera edile", quantity: 1, base_cost: 320.0 },
    TemplateItem { description: "Materiali edili", quantity: 1, base_cost: 280.0 },
    TemplateItem { description: "Trasporto e mezzi d'opera", quantity: 1, base_cost: 150.0 },
];

const FALEGNAME_ARREDO: &[TemplateItem] = &[
    TemplateItem { description: "Progettazione arredo su misura", quantity: 1, base_cost: 260.0 },
    TemplateItem { description: "Realizzazione mobile su misura", quantity: 1, base_cost: 1250.0 },
    TemplateItem { description: "Montaggio in opera", quantity: 1, base_cost: 340.0 },
];

const FALEGNAME_SERRAMENTI: &[TemplateItem] = &[
    TemplateItem { description: "Fornitura serramenti in legno", quantity: 1, base_cost: 1600.0 },
    TemplateItem { description: "Posa in opera serramenti", quantity: 1, base_cost: 420.0 },
    TemplateItem { description: "Smaltimento vecchi infissi", quantity: 1, base_cost: 110.0 },
];

const FALEGNAME_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Manodopera falegname", quantity: 1, base_cost: 300.0 },
    TemplateItem { description: "Legname e ferramenta", quantity: 1, base_cost: 240.0 },
    TemplateItem { description: "Trasporto e montaggio", quantity: 1, base_cost: 120.0 },
];

const CONSULENTI_STRATEGIA: &[TemplateItem] = &[
    TemplateItem { description: "Analisi preliminare del contesto aziendale", quantity: 1, base_cost: 450.0 },
    TemplateItem { description: "Piano strategico e roadmap operativa", quantity: 1, base_cost: 900.0 },
    TemplateItem { description: "Sessioni di allineamento con il management", quantity: 2, base_cost: 250.0 },
];

const CONSULENTI_CONTENZIOSO: &[TemplateItem] = &[
    TemplateItem { description: "Studio della pratica e della documentazione", quantity: 1, base_cost: 380.0 },
    TemplateItem { description: "Redazione atti e memorie", quantity: 1, base_cost: 650.0 },
    TemplateItem { description: "Assistenza alle udienze", quantity: 2, base_cost: 300.0 },
];

const CONSULENTI_FORMAZIONE: &[TemplateItem] = &[
    TemplateItem { description: "Progettazione percorso formativo", quantity: 1, base_cost: 400.0 },
    TemplateItem { description: "Giornata di formazione in aula", quantity: 2, base_cost: 550.0 },
    TemplateItem { description: "Report finale e follow-up", quantity: 1, base_cost: 200.0 },
];

const CONSULENTI_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Inquadramento dell'esigenza e obiettivi", quantity: 1, base_cost: 300.0 },
    TemplateItem { description: "Attività di consulenza dedicata", quantity: 1, base_cost: 700.0 },
    TemplateItem { description: "Relazione conclusiva", quantity: 1, base_cost: 200.0 },
];

const AVVOCATO_CONTENZIOSO: &[TemplateItem] = &[
    TemplateItem { description: "Esame della controversia e parere scritto", quantity: 1, base_cost: 420.0 },
    TemplateItem { description: "Redazione atto introduttivo", quantity: 1, base_cost: 780.0 },
    TemplateItem { description: "Partecipazione alle udienze", quantity: 3, base_cost: 280.0 },
];

const AVVOCATO_CONTRATTI: &[TemplateItem] = &[
    TemplateItem { description: "Analisi e revisione contrattuale", quantity: 1, base_cost: 380.0 },
    TemplateItem { description: "Redazione clausole personalizzate", quantity: 1, base_cost: 450.0 },
    TemplateItem { description: "Assistenza alla negoziazione", quantity: 1, base_cost: 350.0 },
];

const AVVOCATO_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Primo inquadramento della questione legale", quantity: 1, base_cost: 250.0 },
    TemplateItem { description: "Attività professionale di assistenza", quantity: 1, base_cost: 800.0 },
    TemplateItem { description: "Comunicazioni e adempimenti di studio", quantity: 1, base_cost: 150.0 },
];

const ARCHITETTO_PROGETTO: &[TemplateItem] = &[
    TemplateItem { description: "Rilievo dello stato di fatto", quantity: 1, base_cost: 350.0 },
    TemplateItem { description: "Progetto preliminare e definitivo", quantity: 1, base_cost: 1200.0 },
    TemplateItem { description: "Pratiche edilizie e depositi", quantity: 1, base_cost: 480.0 },
];

const ARCHITETTO_DIREZIONE: &[TemplateItem] = &[
    TemplateItem { description: "Direzione lavori", quantity: 1, base_cost: 950.0 },
    TemplateItem { description: "Contabilità di commessa e SAL", quantity: 1, base_cost: 420.0 },
];

const ARCHITETTO_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Consulenza architettonica preliminare", quantity: 1, base_cost: 300.0 },
    TemplateItem { description: "Elaborati progettuali", quantity: 1, base_cost: 900.0 },
    TemplateItem { description: "Assistenza pratiche amministrative", quantity: 1, base_cost: 350.0 },
];

const COMMERCIALISTA_DICHIARAZIONI: &[TemplateItem] = &[
    TemplateItem { description: "Raccolta e verifica documentazione contabile", quantity: 1, base_cost: 220.0 },
    TemplateItem { description: "Elaborazione dichiarazione dei redditi", quantity: 1, base_cost: 380.0 },
    TemplateItem { description: "Invii telematici e ricevute", quantity: 1, base_cost: 90.0 },
];

const COMMERCIALISTA_CONTABILITA: &[TemplateItem] = &[
    TemplateItem { description: "Tenuta contabilità ordinaria annuale", quantity: 1, base_cost: 1500.0 },
    TemplateItem { description: "Liquidazioni IVA periodiche", quantity: 4, base_cost: 120.0 },
    TemplateItem { description: "Bilancio e nota integrativa", quantity: 1, base_cost: 650.0 },
];

const COMMERCIALISTA_DEFAULT: &[TemplateItem] = &[
    TemplateItem { description: "Inquadramento fiscale della posizione", quantity: 1, base_cost: 200.0 },
    TemplateItem { description: "Assistenza contabile e fiscale", quantity: 1, base_cost: 600.0 },
    TemplateItem { description: "Adempimenti telematici", quantity: 1, base_cost: 120.0 },
];

pub(super) const CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        id: "idraulico",
        label: "Idraulico",
        kind: CategoryKind::Craft {
            keyword_groups: &[
                KeywordGroup {
                    name: "bagno",
                    keywords: &["bagno", "sanitari", "doccia", "wc", "bidet"],
                    items: IDRAULICO_BAGNO,
                },
                KeywordGroup {
                    name: "caldaia",
                    keywords: &["caldaia", "riscaldamento", "termosifoni", "condensazione"],
                    items: IDRAULICO_CALDAIA,
                },
                KeywordGroup {
                    name: "perdite",
                    keywords: &["perdita", "infiltrazione", "allagamento", "tubo rotto"],
                    items: IDRAULICO_PERDITE,
                },
            ],
        },
        default_items: IDRAULICO_DEFAULT,
    },
    CategoryDef {
        id: "elettricista",
        label: "Elettricista",
        kind: CategoryKind::Craft {
            keyword_groups: &[
                KeywordGroup {
                    name: "impianto",
                    keywords: &["impianto", "quadro", "prese", "punti luce", "messa a norma"],
                    items: ELETTRICISTA_IMPIANTO,
                },
                KeywordGroup {
                    name: "domotica",
                    keywords: &["domotica", "smart", "automazione"],
                    items: ELETTRICISTA_DOMOTICA,
                },
            ],
        },
        default_items: ELETTRICISTA_DEFAULT,
    },
    CategoryDef {
        id: "imbianchino",
        label: "Imbianchino",
        kind: CategoryKind::Craft {
            keyword_groups: &[
                KeywordGroup {
                    name: "tinteggiatura",
                    keywords: &["tinteggiatura", "pittura", "pareti", "imbiancare"],
                    items: IMBIANCHINO_TINTEGGIATURA,
                },
                KeywordGroup {
                    name: "cartongesso",
                    keywords: &["cartongesso", "controsoffitto", "parete divisoria"],
                    items: IMBIANCHINO_CARTONGESSO,
                },
            ],
        },
        default_items: IMBIANCHINO_DEFAULT,
    },
    CategoryDef {
        id: "muratore",
        label: "Muratore",
        kind: CategoryKind::Craft {
            keyword_groups: &[
                KeywordGroup {
                    name: "ristrutturazione",
                    keywords: &["ristrutturazione", "demolizione", "tramezzo", "muro"],
                    items: MURATORE_RISTRUTTURAZIONE,
                },
                KeywordGroup {
                    name: "pavimenti",
                    keywords: &["pavimento", "piastrelle", "massetto", "gres"],
                    items: MURATORE_PAVIMENTI,
                },
            ],
        },
        default_items: MURATORE_DEFAULT,
    },
    CategoryDef {
        id: "falegname",
        label: "Falegname",
        kind: CategoryKind::Craft {
            keyword_groups: &[
                KeywordGroup {
                    name: "arredo",
                    keywords: &["mobile", "armadio", "libreria", "cucina su misura"],
                    items: FALEGNAME_ARREDO,
                },
                KeywordGroup {
                    name: "serramenti",
                    keywords: &["serramenti", "infissi", "finestre", "porte"],
                    items: FALEGNAME_SERRAMENTI,
                },
            ],
        },
        default_items: FALEGNAME_DEFAULT,
    },
    CategoryDef {
        id: "consulenti",
        label: "Consulenti",
        kind: CategoryKind::Knowledge {
            job_types: &[
                JobTypeEntry { job_type: "consulenza strategica", items: CONSULENTI_STRATEGIA },
                JobTypeEntry { job_type: "contenzioso civile", items: CONSULENTI_CONTENZIOSO },
                JobTypeEntry { job_type: "formazione", items: CONSULENTI_FORMAZIONE },
            ],
        },
        default_items: CONSULENTI_DEFAULT,
    },
    CategoryDef {
        id: "avvocato",
        label: "Avvocato",
        kind: CategoryKind::Knowledge {
            job_types: &[
                JobTypeEntry { job_type: "contenzioso", items: AVVOCATO_CONTENZIOSO },
                JobTypeEntry { job_type: "contrattualistica", items: AVVOCATO_CONTRATTI },
            ],
        },
        default_items: AVVOCATO_DEFAULT,
    },
    CategoryDef {
        id: "architetto",
        label: "Architetto",
        kind: CategoryKind::Knowledge {
            job_types: &[
                JobTypeEntry { job_type: "progettazione", items: ARCHITETTO_PROGETTO },
                JobTypeEntry { job_type: "direzione lavori", items: ARCHITETTO_DIREZIONE },
            ],
        },
        default_items: ARCHITETTO_DEFAULT,
    },
    CategoryDef {
        id: "commercialista",
        label: "Commercialista",
        kind: CategoryKind::Knowledge {
            job_types: &[
                JobTypeEntry { job_type: "dichiarazione dei redditi", items: COMMERCIALISTA_DICHIARAZIONI },
                JobTypeEntry { job_type: "contabilità", items: COMMERCIALISTA_CONTABILITA },
            ],
        },
        default_items: COMMERCIALISTA_DEFAULT,
    },
];
