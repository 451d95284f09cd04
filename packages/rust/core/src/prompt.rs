//! Instruction template wrapped around every prompt.

const PREAMBLE: &str =
    "Nutze den folgenden Seiteninhalt als Kontext und beantworte präzise im gewünschten Format.";
const CONTEXT_START: &str = "--- Kontext Anfang ---";
const CONTEXT_END: &str = "--- Kontext Ende ---";
const TASK_LABEL: &str = "Aufgabe:";

/// Combine page text and a prompt line: context block first, task block last.
pub fn build_prompt(page_text: &str, prompt: &str) -> String {
    format!("{PREAMBLE}\n{CONTEXT_START}\n{page_text}\n{CONTEXT_END}\n{TASK_LABEL} {prompt}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_precedes_task() {
        let text = build_prompt("Hello world ", "Summarize");
        let context = text.find("Hello world").unwrap();
        let end = text.find(CONTEXT_END).unwrap();
        let task = text.find("Aufgabe: Summarize").unwrap();
        assert!(text.find(CONTEXT_START).unwrap() < context);
        assert!(context < end && end < task);
        assert!(text.ends_with("Aufgabe: Summarize\n"));
    }

    #[test]
    fn page_text_is_embedded_verbatim() {
        let page = "line 1\n'quoted' \"double\" $HOME `tick`";
        let text = build_prompt(page, "x");
        assert!(text.contains(page));
    }

    #[test]
    fn exact_layout() {
        assert_eq!(
            build_prompt("P", "T"),
            "Nutze den folgenden Seiteninhalt als Kontext und beantworte präzise im gewünschten Format.\n\
             --- Kontext Anfang ---\nP\n--- Kontext Ende ---\nAufgabe: T\n"
        );
    }
}
