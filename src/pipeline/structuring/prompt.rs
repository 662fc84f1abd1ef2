use crate::models::TargetField;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "Sen kira sözleşmelerinden alan çıkaran bir asistansın. \
Yalnızca metinde açıkça yazan bilgileri kullan. Cevabın yalnızca geçerli bir JSON nesnesi olsun; \
anahtarlar alan adlarıdır. Metinde bulunmayan alanları atla.";

/// Document label used when the caller gives none.
pub const DEFAULT_DOCUMENT_LABEL: &str = "kira sözleşmesi";

/// Build the extraction prompt for one document.
pub fn build_extraction_prompt(raw_text: &str, document_type: &str) -> String {
    let label = match document_type.trim() {
        "" => DEFAULT_DOCUMENT_LABEL,
        label => label,
    };
    let fields = TargetField::ALL
        .iter()
        .map(TargetField::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Aşağıdaki metinden belirtilen alanları JSON olarak çıkar.\n\
         Belge tipi: {label}\n\
         Çıkarılacak alanlar: {fields}\n\
         Her alan için şu JSON formatında cevap ver:\n\
         {{\"value\": \"...\", \"confidence\": 0-1, \"source_quote\": \"...\"}}\n\n\
         Metin:\n{raw_text}"
    )
}
