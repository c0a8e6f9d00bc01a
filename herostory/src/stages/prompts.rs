//! Prompt templates for every generative call the pipeline makes.

/// Characters of the story passed to image prompt requests.
pub const STORY_EXCERPT_CHARS: usize = 200;

/// Characters of the world description used by the music fallback.
const WORLD_EXCERPT_CHARS: usize = 120;

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The critical story prompt.
#[must_use]
pub fn story(character: &str, world: &str) -> String {
    format!(
        "Write an engaging ~1000-word short story about this hero.\n\
         Character:\n{character}\n\
         World:\n{world}\n\
         Style: cinematic, slightly whimsical, family-friendly."
    )
}

/// Asks for the hero's name only.
#[must_use]
pub fn hero_name(character: &str) -> String {
    format!(
        "Extract the hero's name from this character profile. \
         Reply with the name only, or \"unknown\" if no name is given.\n\n{character}"
    )
}

/// Asks the text model to describe a full-page background illustration.
#[must_use]
pub fn background_description(world: &str, story: &str) -> String {
    format!(
        "Write a single-paragraph illustration prompt for a full-page background \
         landscape of this world. Do not include any characters.\n\
         World:\n{world}\n\
         Story opening:\n{}",
        excerpt(story, STORY_EXCERPT_CHARS)
    )
}

/// Asks the text model to describe a hero scene illustration.
#[must_use]
pub fn hero_scene_description(character: &str, story: &str) -> String {
    format!(
        "Write a single-paragraph illustration prompt for a hero scene showing \
         this character in a defining moment of the story.\n\
         Character:\n{character}\n\
         Story opening:\n{}",
        excerpt(story, STORY_EXCERPT_CHARS)
    )
}

/// Wraps a generated description into the final image prompt.
#[must_use]
pub fn illustration(description: &str) -> String {
    format!("Studio Ghibli style, cinematic, {}", description.trim())
}

/// Asks the text model to describe an instrumental soundtrack.
#[must_use]
pub fn soundtrack_description(world: &str, character: &str) -> String {
    format!(
        "Write a one-paragraph prompt for an instrumental soundtrack with no vocals \
         that fits this hero and their world. Mention mood, instruments and tempo.\n\
         World:\n{world}\n\
         Character:\n{character}"
    )
}

/// Music prompt used when the soundtrack description cannot be generated.
#[must_use]
pub fn soundtrack_fallback(world: &str) -> String {
    let setting = excerpt(world.trim(), WORLD_EXCERPT_CHARS);
    if setting.is_empty() {
        "Instrumental cinematic fantasy theme, orchestral textures, light percussion, gentle strings."
            .to_string()
    } else {
        format!(
            "Instrumental cinematic fantasy theme inspired by {setting}, \
             orchestral textures, light percussion, gentle strings."
        )
    }
}

/// Asks for real-life parallels drawn from the story.
#[must_use]
pub fn analogy(hero_name: &str, story: &str) -> String {
    format!(
        "Infer the reader's personality from this story about {hero_name} and suggest \
         real-life parallels and steps for them to embark on their own adventures:\n{story}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héros", 2), "hé");
        assert_eq!(excerpt("abc", 10), "abc");
        assert_eq!(excerpt("", 5), "");
    }

    #[test]
    fn test_image_prompts_use_story_excerpt() {
        let story = "x".repeat(500);
        let prompt = hero_scene_description("Ren, a lantern keeper", &story);
        assert!(prompt.contains("Ren, a lantern keeper"));
        assert!(prompt.contains(&"x".repeat(STORY_EXCERPT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(STORY_EXCERPT_CHARS + 1)));
    }

    #[test]
    fn test_illustration_style() {
        assert_eq!(
            illustration("  a lighthouse at dusk \n"),
            "Studio Ghibli style, cinematic, a lighthouse at dusk"
        );
    }

    #[test]
    fn test_soundtrack_fallback() {
        let prompt = soundtrack_fallback("A floating archipelago");
        assert!(prompt.starts_with("Instrumental cinematic fantasy theme"));
        assert!(prompt.contains("A floating archipelago"));
        assert!(prompt.ends_with("gentle strings."));

        assert!(soundtrack_fallback("   ").contains("orchestral textures"));
    }

    #[test]
    fn test_story_prompt_mentions_inputs() {
        let prompt = story("Ren", "Misty valley");
        assert!(prompt.contains("~1000-word short story"));
        assert!(prompt.contains("Character:\nRen"));
        assert!(prompt.contains("World:\nMisty valley"));
    }
}
