use std::path::Path;

use crate::store::Responsable;

/// Fixed export target, relative to the working directory. Overwritten on
/// every export.
pub const EXPORT_PATH: &str = "responsables_export.xlsx";

const HEADERS: [&str; 9] = [
    "id", "sede", "escuela", "carrera", "nivel", "jornada", "usuario", "nombre", "apellido",
];

fn cell_ref(col: usize, row: usize) -> String {
    format!("{}{}", (b'A' + col as u8) as char, row)
}

/// Serializes a query result to a single-sheet workbook: one header row, one
/// row per record. Returns the number of records written.
pub fn write_xlsx(rows: &[Responsable], path: &Path) -> anyhow::Result<usize> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .expect("fresh workbook always has Sheet1");

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.get_cell_mut(cell_ref(col, 1).as_str()).set_value(*header);
    }
    for (i, row) in rows.iter().enumerate() {
        let fields = [
            row.id.to_string(),
            row.sede.clone(),
            row.escuela.clone(),
            row.carrera.clone(),
            row.nivel.clone(),
            row.jornada.clone(),
            row.usuario.clone(),
            row.nombre.clone(),
            row.apellido.clone(),
        ];
        for (col, value) in fields.iter().enumerate() {
            sheet
                .get_cell_mut(cell_ref(col, i + 2).as_str())
                .set_value(value.as_str());
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| anyhow::anyhow!("failed to write spreadsheet {}: {:?}", path.to_string_lossy(), e))?;
    Ok(rows.len())
}
