//! Closed label sets for both classification targets.

/// One allowed label, optionally with matching hints shown to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyEntry {
    pub label: &'static str,
    pub hint: Option<&'static str>,
}

const fn entry(label: &'static str) -> TaxonomyEntry {
    TaxonomyEntry { label, hint: None }
}

const fn hinted(label: &'static str, hint: &'static str) -> TaxonomyEntry {
    TaxonomyEntry {
        label,
        hint: Some(hint),
    }
}

pub const TITLE_TAXONOMY: &[TaxonomyEntry] = &[
    entry("Аналитик данных"),
    entry("BI-аналитик"),
    entry("Системный аналитик"),
    entry("Бизнес аналитик"),
    entry("Веб-аналитик"),
    entry("Финансовый аналитик"),
    entry("Продуктовый аналитик"),
    entry("ML/AI-инженер"),
    entry("Разработчик"),
    entry("DevOps-инженер"),
    entry("Директор по маркетингу"),
    entry("Генеральный директор"),
    entry("Коммерческий директор"),
    entry("Директор по продукту"),
    entry("Маркетолог"),
    entry("Главный маркетолог"),
    entry("Руководитель по контенту"),
    entry("Директор по продажам"),
    entry("Специалист по трафику"),
    entry("Менеджер продукта"),
    entry("Другое"),
];

pub const FIELD_TAXONOMY: &[TaxonomyEntry] = &[
    hinted(
        "IT",
        "технологии, разработка, софт, saas, ai, it, crm, big data и подобные",
    ),
    hinted(
        "Финансы",
        "мфо, банки, банковские услуги, банкинг, финтех, инвестиции, страхование и подобные",
    ),
    hinted("Ритейл", "розничная торговля, FMCG и подобные"),
    hinted(
        "E-commerce",
        "интернет-магазины, маркетплейсы, e-commerce и подобные",
    ),
    hinted("Производство", "промышленность, заводы и подобные"),
    hinted("Медицина", "здравоохранение, фармацевтика и подобные"),
    hinted(
        "Образование",
        "EdTech, курсы, онлайн образование и подобные",
    ),
    hinted("Маркетинг", "реклама, digital, медиа, cpa и подобные"),
    hinted("Логистика", "доставка, транспорт и подобные"),
    hinted("Туризм", "путешествия, гостиницы и подобные"),
    hinted("Телеком", "связь, интернет и подобные"),
    hinted("Недвижимость", "строительство, аренда и подобные"),
    hinted("Энергетика", "нефть, газ, электричество и подобные"),
    hinted(
        "Государственный сектор",
        "госуслуги, государственный и подобное",
    ),
    hinted("Консалтинг", "консалтинговые услуги и подобные"),
    hinted(
        "Развлечения",
        "азартные игры, igaming, gambling и подобные",
    ),
    hinted("Сфера услуг", "hr, юридические услуги и подобные"),
    hinted("Другое", "если не было совпадений с категориями выше"),
];

/// Whether `label` is one of the taxonomy's labels (exact match).
pub fn contains(taxonomy: &[TaxonomyEntry], label: &str) -> bool {
    taxonomy.iter().any(|e| e.label == label)
}
