use crate::domain::diff::PreparedDiff;

pub const SYSTEM_PROMPT: &str = "You are an assistant that generates clear and concise commit \
messages following GitHub standards. You not only describe what was done, but also identify \
the changes and the affected files. The commit message must be in English. Reply with the \
commit message only.";

pub fn user_prompt(diff: &PreparedDiff) -> String {
    let mut prompt = String::from("Generate a commit message for the following diff:\n\n");
    prompt.push_str(&diff.text);
    if diff.truncated {
        prompt.push_str(
            "\n\nThe diff above was truncated; describe the visible changes without guessing at the rest.",
        );
    }
    prompt
}
